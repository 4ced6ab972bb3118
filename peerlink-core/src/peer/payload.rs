// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer Wire Payloads
//!
//! Frames exchanged over an open peer channel, and the negotiation blobs
//! exchanged out of band to open one. Negotiation blobs are opaque to the
//! carrier: base64 over JSON, pasted or relayed between the two sides.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::PeerError;
use crate::chat::{Announcement, Message};

/// A frame on an open peer channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PeerFrame {
    /// A chat message delivered directly.
    Message { message: Message },
    /// An announcement forwarded directly.
    Announcement { announcement: Announcement },
    /// Identity exchange, sent by each side when the channel opens.
    Identity { user_id: String, display_name: String },
}

/// Out-of-band negotiation payload, one of the two handshake blobs.
///
/// The `type` tag keeps the two kinds apart on the wire: an answer pasted
/// where an offer belongs must fail decoding, not open a bogus session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NegotiationBlob {
    Offer(Offer),
    Answer(Answer),
}

/// Connection offer, created by the initiating side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Fresh id for this negotiation attempt.
    pub session_id: String,
    /// Initiator's user id.
    pub from_id: String,
    /// Opaque session description of the initiating endpoint.
    pub description: String,
    /// Gathered network candidates, in discovery order. Empty for channels
    /// that need none, such as in-process pairs.
    #[serde(default)]
    pub ice_candidates: Vec<String>,
}

/// Answer to an offer, created by the accepting side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Session id copied from the offer being answered.
    pub session_id: String,
    /// Accepter's user id.
    pub from_id: String,
    /// Opaque session description of the accepting endpoint.
    pub description: String,
    /// Gathered network candidates, in discovery order.
    #[serde(default)]
    pub ice_candidates: Vec<String>,
}

/// Encodes a negotiation payload as an opaque base64 blob.
pub fn encode_blob<T: Serialize>(payload: &T) -> Result<String, PeerError> {
    let json = serde_json::to_vec(payload)
        .map_err(|e| PeerError::InvalidPayload(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decodes a negotiation blob produced by [`encode_blob`].
pub fn decode_blob<T: DeserializeOwned>(blob: &str) -> Result<T, PeerError> {
    let json = STANDARD
        .decode(blob.trim())
        .map_err(|e| PeerError::InvalidPayload(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| PeerError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_offer() -> NegotiationBlob {
        NegotiationBlob::Offer(Offer {
            session_id: "s-1".into(),
            from_id: "a1".into(),
            description: "desc".into(),
            ice_candidates: vec!["cand-1".into()],
        })
    }

    #[test]
    fn test_blob_roundtrip() {
        let offer = sample_offer();

        let blob = encode_blob(&offer).unwrap();
        // Opaque on the wire
        assert!(!blob.contains('{') && !blob.contains('"'));

        let decoded: NegotiationBlob = decode_blob(&blob).unwrap();
        assert_eq!(decoded, offer);
    }

    #[test]
    fn test_blob_kinds_are_tagged() {
        let json = serde_json::to_string(&sample_offer()).unwrap();
        assert!(json.contains("\"type\":\"offer\""));

        let answer = NegotiationBlob::Answer(Answer {
            session_id: "s-1".into(),
            from_id: "b2".into(),
            description: "desc".into(),
            ice_candidates: Vec::new(),
        });
        let json = serde_json::to_string(&answer).unwrap();
        assert!(json.contains("\"type\":\"answer\""));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_blob::<NegotiationBlob>("!!not-base64!!").is_err());

        let untagged = STANDARD.encode(b"{\"nope\": true}");
        assert!(decode_blob::<NegotiationBlob>(&untagged).is_err());
    }

    #[test]
    fn test_frame_uses_type_tag() {
        let frame = PeerFrame::Identity {
            user_id: "a1".into(),
            display_name: "Alice".into(),
        };

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"identity\""));
    }
}
