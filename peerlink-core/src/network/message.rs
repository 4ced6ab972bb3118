// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Message Types
//!
//! Wire protocol message types for relay communication. The relay only
//! routes: it reads `receiver_id` fields for addressing and never inspects
//! message content beyond that.

use serde::{Deserialize, Serialize};

use crate::chat::{Announcement, Message, MessageStatus};

/// Unique message identifier for deduplication.
pub type MessageId = String;

/// Wire protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Envelope wrapping all messages on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Protocol version for compatibility checking.
    pub version: u8,
    /// Unique envelope ID (UUID v4), the deduplication key.
    pub message_id: MessageId,
    /// Milliseconds since the Unix epoch when the envelope was created.
    pub timestamp: u64,
    /// The actual message content.
    pub payload: RelayPayload,
}

/// Types of messages that travel through the relay, both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelayPayload {
    /// Client -> relay: bind this connection to a user id.
    Register(Register),
    /// Client -> relay: route a chat message to its receiver.
    PrivateMessage(PrivateMessage),
    /// Client -> relay: notify the sender that their message was read.
    MessageRead(ReadReceipt),
    /// Client -> relay: publish an announcement to every connected client.
    Broadcast(BroadcastRequest),
    /// Relay -> client: an inbound chat message.
    NewMessage(Message),
    /// Relay -> client: delivery status change for a message this client
    /// sent.
    StatusUpdate(StatusUpdate),
    /// Relay -> client: a broadcast announcement.
    NewAnnouncement(Announcement),
    /// Relay -> client: one user's presence changed.
    Presence(PresenceUpdate),
    /// Relay -> client: full presence roster, sent after registration.
    OnlineUsers(Vec<String>),
}

/// Binds a relay connection to a user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Register {
    pub user_id: String,
}

/// A chat message in transit. The relay routes on `message.receiver_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub message: Message,
}

/// Read receipt routed back to the original sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub chat_id: String,
    pub message_id: MessageId,
    /// Who read the message.
    pub reader_id: String,
    /// Original sender, the routing target of this receipt.
    pub sender_id: String,
}

/// Bearer credential authorizing announcement broadcasts.
///
/// The relay compares the token against its configured value; clients never
/// self-assert broadcast rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAuth {
    pub token: String,
}

impl BroadcastAuth {
    pub fn new(token: &str) -> Self {
        BroadcastAuth {
            token: token.to_string(),
        }
    }
}

/// Announcement broadcast request.
///
/// Carries the announcement verbatim so the relay fans out the broadcaster's
/// copy. Every installation then sees the same id, and a copy arriving over
/// both transports deduplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub auth: BroadcastAuth,
    pub announcement: Announcement,
}

/// Delivery status change for a previously sent message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub chat_id: String,
    pub message_id: MessageId,
    pub status: MessageStatus,
}

/// One user's presence change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub user_id: String,
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization_roundtrip() {
        let payload = RelayPayload::MessageRead(ReadReceipt {
            chat_id: "a1_b2".into(),
            message_id: "m-1".into(),
            reader_id: "b2".into(),
            sender_id: "a1".into(),
        });

        let json = serde_json::to_string(&payload).unwrap();
        let back: RelayPayload = serde_json::from_str(&json).unwrap();

        match back {
            RelayPayload::MessageRead(r) => {
                assert_eq!(r.sender_id, "a1");
                assert_eq!(r.reader_id, "b2");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_carries_auth_token() {
        let req = BroadcastRequest {
            auth: BroadcastAuth::new("secret"),
            announcement: Announcement::new("Maintenance", "Relay restarts at noon", 1_000),
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("secret"));

        let back: BroadcastRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.auth, BroadcastAuth::new("secret"));
        assert_eq!(back.announcement.id, req.announcement.id);
    }
}
