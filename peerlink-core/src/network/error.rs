// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types
//!
//! Error types for network and transport operations.

use thiserror::Error;

/// Network and transport error types.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection timeout")]
    Timeout,

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Message receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport not connected")]
    NotConnected,
}
