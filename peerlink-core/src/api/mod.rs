// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! PeerLink API Layer
//!
//! High-level API for the PeerLink messaging core.
//!
//! # Overview
//!
//! The API layer provides a clean interface that coordinates:
//! - Profile and pairing management
//! - Chats, messages, and announcements
//! - Dual-transport dispatch (direct peer first, relay fallback)
//! - Persistence with backup recovery
//! - Event handling
//!
//! # Example
//!
//! ```ignore
//! use peerlink_core::api::{AppConfig, PeerLink};
//!
//! let mut app = PeerLink::new(AppConfig::default())?;
//! app.create_profile("Alice", "0791234567")?;
//!
//! let outcome = app.accept_invite(&their_link, "Bob")?;
//! app.connect()?;
//! app.send_message(&their_id, "hello")?;
//!
//! for event in app.process_incoming()? {
//!     println!("event: {event:?}");
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`error`] - Error types for the API layer
//! - [`config`] - Configuration types
//! - [`events`] - Event system for callbacks
//! - [`validation`] - Input validation bounds
//! - [`app`] - Main PeerLink orchestrator

#[cfg(feature = "testing")]
pub mod app;
#[cfg(not(feature = "testing"))]
mod app;

#[cfg(feature = "testing")]
pub mod config;
#[cfg(not(feature = "testing"))]
mod config;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod events;
#[cfg(not(feature = "testing"))]
mod events;

#[cfg(feature = "testing")]
pub mod validation;
#[cfg(not(feature = "testing"))]
mod validation;

// Error types
pub use error::{AppError, AppResult};

// Configuration
pub use config::{AppConfig, PeerConfig, RelayConfig};

// Events
pub use events::{AppEvent, CallbackHandler, EventDispatcher, EventHandler};

// Validation
pub use validation::{
    validate_announcement, validate_display_name, validate_local_display_name,
    validate_message_text, validate_phone_number, ValidationError,
};

// Orchestrator
pub use app::PeerLink;
