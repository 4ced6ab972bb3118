// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network + Transport Layer
//!
//! Relay-side half of message dispatch: transport abstraction, wire protocol,
//! and a client that registers a user id and streams inbound events.
//!
//! # Architecture
//!
//! - **Transport trait**: platform-agnostic interface for relay I/O
//! - **Message types**: wire protocol envelopes and payloads
//! - **Protocol layer**: serialization and length framing
//! - **Relay client**: registration, sends, and deduplicated polling
//!
//! # Example
//!
//! ```ignore
//! use peerlink_core::network::{MockTransport, RelayClient, RelayClientConfig};
//!
//! let transport = MockTransport::new();
//! let mut client = RelayClient::new(transport, RelayClientConfig::default(), "my-id".into());
//!
//! client.connect()?;
//! client.send_message(&message)?;
//! let events = client.poll()?;
//! ```

#[cfg(feature = "testing")]
pub mod client;
#[cfg(not(feature = "testing"))]
mod client;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod message;
#[cfg(not(feature = "testing"))]
mod message;

#[cfg(feature = "testing")]
pub mod mock;
#[cfg(not(feature = "testing"))]
mod mock;

#[cfg(feature = "testing")]
pub mod protocol;
#[cfg(not(feature = "testing"))]
mod protocol;

#[cfg(feature = "testing")]
pub mod transport;
#[cfg(not(feature = "testing"))]
mod transport;

#[cfg(feature = "network")]
mod websocket;

// Error types
pub use error::NetworkError;

// Message types
pub use message::{
    BroadcastAuth, BroadcastRequest, MessageEnvelope, MessageId, PresenceUpdate, PrivateMessage,
    ReadReceipt, Register, RelayPayload, StatusUpdate, PROTOCOL_VERSION,
};

// Protocol utilities
pub use protocol::{
    create_envelope, decode_message, encode_message, read_frame_length, FRAME_HEADER_SIZE,
    MAX_MESSAGE_SIZE,
};

// Transport abstraction
pub use transport::{ConnectionState, Transport, TransportConfig, TransportResult};

// Mock transport for testing
pub use mock::MockTransport;

// WebSocket transport for production
#[cfg(feature = "network")]
pub use websocket::WebSocketTransport;

// Relay client
pub use client::{RelayClient, RelayClientConfig, RelayEvent};
