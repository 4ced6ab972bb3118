// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the PeerLink API layer.

use thiserror::Error;

use super::validation::ValidationError;
use crate::chat::ChatError;
use crate::network::NetworkError;
use crate::peer::PeerError;
use crate::storage::StorageError;

/// Unified error type for PeerLink operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Chat state transition was rejected.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Relay operation failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Peer transport operation failed.
    #[error("peer error: {0}")]
    Peer(#[from] PeerError),

    /// Profile not yet created.
    #[error("profile not initialized")]
    ProfileNotInitialized,

    /// Profile already exists.
    #[error("already initialized")]
    AlreadyInitialized,

    /// Operation requires a paired user.
    #[error("user not paired: {0}")]
    NotPaired(String),

    /// Invalid operation in current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for PeerLink operations.
pub type AppResult<T> = Result<T, AppError>;
