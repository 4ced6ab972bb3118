// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chat State
//!
//! Canonical in-memory representation of chats, messages, announcements, and
//! the pairing roster, plus the state machine that applies every mutation.
//!
//! Chat identity is deterministic: the sorted pair of participant ids joined
//! by `_`, so both installations derive the same `chat_id` independently and
//! chat creation is idempotent.

#[cfg(feature = "testing")]
pub mod announcement;
#[cfg(not(feature = "testing"))]
mod announcement;

#[cfg(feature = "testing")]
pub mod message;
#[cfg(not(feature = "testing"))]
mod message;

#[cfg(feature = "testing")]
pub mod state;
#[cfg(not(feature = "testing"))]
mod state;

pub use announcement::Announcement;
pub use message::{Message, MessageFile, MessageStatus, EDIT_WINDOW_MS};
pub use state::{ChatError, ChatState, PairOutcome};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Computes the deterministic chat id for an unordered pair of user ids.
///
/// Pure and symmetric: both participants derive the same value.
pub fn chat_id_for(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}_{hi}")
}

/// Current milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_millis() as u64
}

/// Display snapshot of one participant, denormalized into the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDetails {
    pub display_name: String,
    pub avatar: String,
}

/// A two-party chat.
///
/// Never physically deleted; only its message history can be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: String,
    /// Exactly two user ids, sorted.
    pub participants: [String; 2],
    pub participant_details: HashMap<String, ParticipantDetails>,
    /// Denormalized pointer to the most recent message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    pub unread_count: u32,
    /// Pairing exists but no message has been sent yet.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_pending: bool,
}
