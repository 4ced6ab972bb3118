// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property-based tests for chat-id derivation, status ordering, and
//! validation.

use proptest::prelude::*;

use peerlink_core::api::{validate_display_name, validate_phone_number};
use peerlink_core::{chat_id_for, ChatState, Message, MessageStatus, UserProfile};

mod common;
use common::strategies::{
    display_name_strategy, message_text_strategy, phone_strategy, status_strategy,
    user_id_strategy,
};

fn rank(status: MessageStatus) -> u8 {
    match status {
        MessageStatus::Sent => 0,
        MessageStatus::Failed => 1,
        MessageStatus::Delivered => 2,
        MessageStatus::Read => 3,
    }
}

proptest! {
    #[test]
    fn chat_id_is_symmetric(a in user_id_strategy(), b in user_id_strategy()) {
        prop_assert_eq!(chat_id_for(&a, &b), chat_id_for(&b, &a));
    }

    #[test]
    fn chat_id_is_deterministic(a in user_id_strategy(), b in user_id_strategy()) {
        prop_assert_eq!(chat_id_for(&a, &b), chat_id_for(&a, &b));
    }

    #[test]
    fn chat_id_contains_both_ids(a in user_id_strategy(), b in user_id_strategy()) {
        let id = chat_id_for(&a, &b);
        prop_assert!(id.contains(a.as_str()));
        prop_assert!(id.contains(b.as_str()));
    }

    #[test]
    fn status_never_regresses(updates in prop::collection::vec(status_strategy(), 0..12)) {
        let mut state = ChatState::new();
        let profile = UserProfile::create("Alice", "0791234567");
        let user_id = profile.user_id.clone();
        state.set_profile(profile);

        let chat_id = state
            .create_or_get_chat("b2", "Bob", None)
            .unwrap()
            .chat_id
            .clone();
        let msg = Message::outgoing(&chat_id, &user_id, "b2", "hi", 1);
        let msg_id = msg.message_id.clone();
        state.add_message(msg).unwrap();

        // Replay receipts in arbitrary order; the stored status must always
        // equal the highest-ranked status observed so far.
        let mut highest = MessageStatus::Sent;
        for status in updates {
            state.update_message_status(&chat_id, &msg_id, status);
            if rank(status) > rank(highest) {
                highest = status;
            }
            prop_assert_eq!(state.messages_for(&chat_id)[0].status, highest);
        }
    }

    #[test]
    fn generated_display_names_validate(name in display_name_strategy()) {
        prop_assert!(validate_display_name(&name).is_ok());
    }

    #[test]
    fn generated_phone_numbers_validate(phone in phone_strategy()) {
        prop_assert!(validate_phone_number(&phone).is_ok());
    }

    #[test]
    fn message_envelope_roundtrip(text in message_text_strategy(), a in user_id_strategy(), b in user_id_strategy()) {
        use peerlink_core::network::{create_envelope, decode_message, encode_message, RelayPayload};

        let chat_id = chat_id_for(&a, &b);
        let message = Message::outgoing(&chat_id, &a, &b, &text, 1_000);
        let envelope = create_envelope(RelayPayload::NewMessage(message.clone()));

        let bytes = encode_message(&envelope).unwrap();
        let decoded = decode_message(&bytes[4..]).unwrap();
        prop_assert_eq!(&decoded.message_id, &envelope.message_id);
        match decoded.payload {
            RelayPayload::NewMessage(m) => prop_assert_eq!(m, message),
            other => prop_assert!(false, "unexpected payload: {:?}", other),
        }
    }
}
