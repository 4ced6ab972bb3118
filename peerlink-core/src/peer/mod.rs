// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer-to-Peer Transport
//!
//! Direct delivery path between two installations, tried before the relay.
//! An offer/answer handshake (carried out of band as opaque blobs) opens a
//! [`PeerChannel`]; once open, chat messages and announcements travel as
//! [`PeerFrame`]s without touching the relay.

#[cfg(feature = "testing")]
pub mod channel;
#[cfg(not(feature = "testing"))]
mod channel;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod payload;
#[cfg(not(feature = "testing"))]
mod payload;

#[cfg(feature = "testing")]
pub mod transport;
#[cfg(not(feature = "testing"))]
mod transport;

pub use channel::{InProcessChannel, PeerChannel};
pub use error::PeerError;
pub use payload::{decode_blob, encode_blob, Answer, NegotiationBlob, Offer, PeerFrame};
pub use transport::{PeerTransport, NEGOTIATION_TIMEOUT_MS};
