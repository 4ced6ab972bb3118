// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Types
//!
//! A message record plus its forward-only delivery status machine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long after sending a message may still be edited (1 hour).
pub const EDIT_WINDOW_MS: u64 = 60 * 60 * 1000;

/// Delivery status of a message copy.
///
/// Status only advances: `Sent -> Delivered -> Read`. `Failed` marks a copy
/// whose outbound dispatch failed on every path; a later delivery or read
/// receipt supersedes it, since the receipt proves delivery happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// Position in the forward-only ordering. `Failed` sits below `Delivered`
    /// so receipts can overwrite it, but above nothing else.
    fn rank(self) -> u8 {
        match self {
            MessageStatus::Sent => 0,
            MessageStatus::Failed => 1,
            MessageStatus::Delivered => 2,
            MessageStatus::Read => 3,
        }
    }

    /// Whether a transition from `self` to `next` is a forward step.
    ///
    /// Re-applying the current status is not an advance (idempotent no-op for
    /// duplicate delivery of the same receipt).
    pub fn can_advance_to(self, next: MessageStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// Descriptor of an attached file. The file body itself is not part of the
/// core state; only the metadata travels with the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFile {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

/// A single chat message as stored by one installation.
///
/// Each participant holds an independent copy of what is conceptually one
/// record; the two deletion flags are therefore per-copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Body text, or the caption when a file is attached.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<MessageFile>,
    /// Milliseconds since the Unix epoch at send time.
    pub timestamp: u64,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub edited: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted_for_me: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted_for_everyone: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

impl Message {
    /// Builds an outgoing text message with a fresh id and `Sent` status.
    pub fn outgoing(
        chat_id: &str,
        sender_id: &str,
        receiver_id: &str,
        text: &str,
        timestamp: u64,
    ) -> Self {
        Message {
            message_id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            text: text.to_string(),
            file: None,
            timestamp,
            status: MessageStatus::Sent,
            edited: false,
            deleted_for_me: false,
            deleted_for_everyone: false,
            reply_to_id: None,
        }
    }

    /// Attaches a file descriptor.
    pub fn with_file(mut self, file: MessageFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Marks this message as a reply to another message in the same chat.
    pub fn in_reply_to(mut self, message_id: &str) -> Self {
        self.reply_to_id = Some(message_id.to_string());
        self
    }

    /// Whether the message is still inside its edit window at `now` (ms).
    pub fn within_edit_window(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) < EDIT_WINDOW_MS
    }

    /// Whether this copy should render at all for the local viewer.
    pub fn visible_locally(&self) -> bool {
        !self.deleted_for_me && !self.deleted_for_everyone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_advances_forward_only() {
        use MessageStatus::*;

        assert!(Sent.can_advance_to(Delivered));
        assert!(Sent.can_advance_to(Read));
        assert!(Delivered.can_advance_to(Read));

        assert!(!Read.can_advance_to(Delivered));
        assert!(!Read.can_advance_to(Sent));
        assert!(!Delivered.can_advance_to(Sent));
        // Duplicate receipt is not an advance
        assert!(!Delivered.can_advance_to(Delivered));
    }

    #[test]
    fn test_failed_is_superseded_by_receipts() {
        use MessageStatus::*;

        assert!(Sent.can_advance_to(Failed));
        assert!(Failed.can_advance_to(Delivered));
        assert!(Failed.can_advance_to(Read));
        assert!(!Delivered.can_advance_to(Failed));
        assert!(!Read.can_advance_to(Failed));
    }

    #[test]
    fn test_edit_window_boundary() {
        let msg = Message::outgoing("c", "a", "b", "hi", 1_000_000);

        assert!(msg.within_edit_window(1_000_000));
        assert!(msg.within_edit_window(1_000_000 + EDIT_WINDOW_MS - 1));
        assert!(!msg.within_edit_window(1_000_000 + EDIT_WINDOW_MS));
    }

    #[test]
    fn test_outgoing_defaults() {
        let msg = Message::outgoing("c", "a", "b", "hi", 42);

        assert_eq!(msg.status, MessageStatus::Sent);
        assert!(!msg.edited);
        assert!(msg.visible_locally());
        assert!(msg.file.is_none());
        assert!(msg.reply_to_id.is_none());
    }
}
