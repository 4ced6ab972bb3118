// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protocol Layer
//!
//! Message serialization, framing, and envelope construction.

use super::error::NetworkError;
use super::message::{MessageEnvelope, RelayPayload, PROTOCOL_VERSION};
use crate::chat::now_millis;

/// Maximum message size (1 MB).
pub const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Frame header size (4 bytes length prefix).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Serializes a message envelope to bytes with length framing.
///
/// Format: [length: 4 bytes big-endian] [json payload]
pub fn encode_message(message: &MessageEnvelope) -> Result<Vec<u8>, NetworkError> {
    let json =
        serde_json::to_vec(message).map_err(|e| NetworkError::Serialization(e.to_string()))?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(NetworkError::InvalidMessage(format!(
            "Message too large: {} bytes (max {})",
            json.len(),
            MAX_MESSAGE_SIZE
        )));
    }

    let len = json.len() as u32;
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + json.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&json);

    Ok(frame)
}

/// Deserializes a message envelope from bytes (after reading the frame).
///
/// Expects just the JSON payload without the length prefix.
pub fn decode_message(data: &[u8]) -> Result<MessageEnvelope, NetworkError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(NetworkError::InvalidMessage(format!(
            "Message too large: {} bytes (max {})",
            data.len(),
            MAX_MESSAGE_SIZE
        )));
    }

    let envelope: MessageEnvelope =
        serde_json::from_slice(data).map_err(|e| NetworkError::InvalidMessage(e.to_string()))?;

    if envelope.version != PROTOCOL_VERSION {
        return Err(NetworkError::InvalidMessage(format!(
            "Unsupported protocol version: {} (expected {})",
            envelope.version, PROTOCOL_VERSION
        )));
    }

    Ok(envelope)
}

/// Reads the length prefix from a frame header.
pub fn read_frame_length(header: &[u8; FRAME_HEADER_SIZE]) -> usize {
    u32::from_be_bytes(*header) as usize
}

/// Creates a new message envelope with a fresh ID and timestamp.
pub fn create_envelope(payload: RelayPayload) -> MessageEnvelope {
    MessageEnvelope {
        version: PROTOCOL_VERSION,
        message_id: uuid::Uuid::new_v4().to_string(),
        timestamp: now_millis(),
        payload,
    }
}
