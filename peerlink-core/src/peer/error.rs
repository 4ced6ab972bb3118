// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer transport error types.

use thiserror::Error;

/// Peer transport error types.
#[derive(Error, Debug, Clone)]
pub enum PeerError {
    #[error("Invalid negotiation payload: {0}")]
    InvalidPayload(String),

    #[error("No session with peer: {0}")]
    UnknownPeer(String),

    #[error("Answer does not match any pending offer: {0}")]
    UnknownSession(String),

    #[error("Channel closed")]
    ChannelClosed,
}
