// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;

use peerlink_core::MessageStatus;

/// Strategy for generating valid display names (3-20 characters).
pub fn display_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{2,19}"
        .prop_map(|s| s.trim().to_string())
        .prop_filter("within bounds", |s| (3..=20).contains(&s.chars().count()))
}

/// Strategy for generating valid phone numbers.
pub fn phone_strategy() -> impl Strategy<Value = String> {
    ("[0-9]{10,15}", any::<bool>()).prop_map(|(digits, plus)| {
        if plus {
            format!("+{}", digits)
        } else {
            digits
        }
    })
}

/// Strategy for generating user ids (short opaque tokens are enough for
/// chat-id derivation).
pub fn user_id_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}"
}

/// Strategy for generating valid message text (1-1000 characters).
pub fn message_text_strategy() -> impl Strategy<Value = String> {
    ".{1,200}".prop_filter("non-empty after trim", |s| !s.is_empty())
}

/// Strategy for generating a delivery status.
pub fn status_strategy() -> impl Strategy<Value = MessageStatus> {
    prop_oneof![
        Just(MessageStatus::Sent),
        Just(MessageStatus::Failed),
        Just(MessageStatus::Delivered),
        Just(MessageStatus::Read),
    ]
}
