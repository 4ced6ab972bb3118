// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Typed state persistence.
//!
//! Per-collection accessors over the key-value store, plus whole-state load
//! and save for the application facade.

use std::collections::HashMap;

use super::{keys, StorageError, Store};
use crate::chat::{Announcement, Chat, ChatState, Message};
use crate::identity::UserProfile;
use crate::roster::{Invite, PairedUser};

impl Store {
    // === Profile ===

    pub fn load_profile(&self) -> Result<Option<UserProfile>, StorageError> {
        self.get(keys::USER_PROFILE)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.set(keys::USER_PROFILE, profile)
    }

    // === Roster ===

    pub fn load_paired_users(&self) -> Result<Vec<PairedUser>, StorageError> {
        Ok(self.get(keys::PAIRED_USERS)?.unwrap_or_default())
    }

    pub fn save_paired_users(&self, users: &[PairedUser]) -> Result<(), StorageError> {
        self.set(keys::PAIRED_USERS, &users)
    }

    pub fn load_invites(&self) -> Result<Vec<Invite>, StorageError> {
        Ok(self.get(keys::INVITES)?.unwrap_or_default())
    }

    pub fn save_invites(&self, invites: &[Invite]) -> Result<(), StorageError> {
        self.set(keys::INVITES, &invites)
    }

    // === Chats and messages ===

    pub fn load_chats(&self) -> Result<Vec<Chat>, StorageError> {
        Ok(self.get(keys::CHATS)?.unwrap_or_default())
    }

    pub fn save_chats(&self, chats: &[Chat]) -> Result<(), StorageError> {
        self.set(keys::CHATS, &chats)
    }

    pub fn load_messages(&self) -> Result<HashMap<String, Vec<Message>>, StorageError> {
        Ok(self.get(keys::MESSAGES)?.unwrap_or_default())
    }

    pub fn save_messages(
        &self,
        messages: &HashMap<String, Vec<Message>>,
    ) -> Result<(), StorageError> {
        self.set(keys::MESSAGES, messages)
    }

    // === Announcements ===

    pub fn load_announcements(&self) -> Result<Vec<Announcement>, StorageError> {
        Ok(self.get(keys::ANNOUNCEMENTS)?.unwrap_or_default())
    }

    pub fn save_announcements(&self, announcements: &[Announcement]) -> Result<(), StorageError> {
        self.set(keys::ANNOUNCEMENTS, &announcements)
    }

    /// Id of the newest announcement the user has opened the list for. Drives
    /// the "new announcement" badge, not per-item read flags.
    pub fn load_last_seen_announcement_id(&self) -> Result<Option<String>, StorageError> {
        self.get(keys::LAST_SEEN_ANNOUNCEMENT_ID)
    }

    pub fn save_last_seen_announcement_id(&self, id: &str) -> Result<(), StorageError> {
        self.set(keys::LAST_SEEN_ANNOUNCEMENT_ID, &id)
    }

    // === Whole state ===

    /// Loads the persisted collections into a fresh [`ChatState`].
    pub fn load_state(&self) -> Result<ChatState, StorageError> {
        Ok(ChatState::from_parts(
            self.load_profile()?,
            self.load_paired_users()?,
            self.load_chats()?,
            self.load_messages()?,
            self.load_announcements()?,
            self.load_invites()?,
        ))
    }

    /// Persists every collection of `state`.
    pub fn save_state(&self, state: &ChatState) -> Result<(), StorageError> {
        if let Some(profile) = state.profile() {
            self.save_profile(profile)?;
        }
        self.save_paired_users(state.paired_users())?;
        self.save_chats(state.chats())?;
        self.save_messages(state.messages_map())?;
        self.save_announcements(state.announcements())?;
        self.save_invites(state.invites())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let store = Store::in_memory().unwrap();

        let mut state = ChatState::new();
        state.set_profile(UserProfile::create("Alice", "0791234567"));
        state.pair("b2", "Bob", 1).unwrap();
        state.create_or_get_chat("b2", "Bob", None).unwrap();

        store.save_state(&state).unwrap();
        let loaded = store.load_state().unwrap();

        assert_eq!(loaded.profile().unwrap().display_name, "Alice");
        assert_eq!(loaded.paired_users().len(), 1);
        assert_eq!(loaded.chats().len(), 1);
        assert_eq!(loaded.invites().len(), 1);
    }

    #[test]
    fn test_empty_store_loads_empty_state() {
        let store = Store::in_memory().unwrap();
        let state = store.load_state().unwrap();

        assert!(state.profile().is_none());
        assert!(state.chats().is_empty());
        assert!(state.paired_users().is_empty());
    }

    #[test]
    fn test_last_seen_announcement_id() {
        let store = Store::in_memory().unwrap();
        assert!(store.load_last_seen_announcement_id().unwrap().is_none());

        store.save_last_seen_announcement_id("ann-1").unwrap();
        assert_eq!(
            store.load_last_seen_announcement_id().unwrap().as_deref(),
            Some("ann-1")
        );
    }
}
