// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup reconciliation.
//!
//! [`Store::open`] heals keys that are missing on one side; this pass goes
//! further and resolves keys that exist on both sides but diverged, for
//! example after the primary was restored from an older copy. Resolution is
//! per key and whole-document: the richer copy wins, documents are never
//! merged entry by entry.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{keys, read_raw, StorageError, Store};
use crate::chat::{Announcement, Chat, Message};
use crate::identity::UserProfile;
use crate::roster::{Invite, PairedUser};

/// Everything the store persists, as one value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub profile: Option<UserProfile>,
    pub paired_users: Vec<PairedUser>,
    pub chats: Vec<Chat>,
    pub messages: HashMap<String, Vec<Message>>,
    pub announcements: Vec<Announcement>,
    pub invites: Vec<Invite>,
}

impl StateSnapshot {
    fn total_messages(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }
}

/// Resolves two diverged snapshots, key by key.
///
/// For collections the copy with more entries wins; for messages the side
/// with more messages in total; a present profile beats an absent one, with
/// the primary preferred when both are present.
pub fn reconcile(primary: StateSnapshot, backup: StateSnapshot) -> StateSnapshot {
    fn richer<T>(a: Vec<T>, b: Vec<T>) -> Vec<T> {
        if b.len() > a.len() {
            b
        } else {
            a
        }
    }

    let messages = if backup.total_messages() > primary.total_messages() {
        backup.messages
    } else {
        primary.messages
    };

    StateSnapshot {
        profile: primary.profile.or(backup.profile),
        paired_users: richer(primary.paired_users, backup.paired_users),
        chats: richer(primary.chats, backup.chats),
        messages,
        announcements: richer(primary.announcements, backup.announcements),
        invites: richer(primary.invites, backup.invites),
    }
}

impl Store {
    /// Loads both databases, resolves divergence, and writes the winning
    /// snapshot back to both sides. Returns the resolved snapshot.
    ///
    /// Without a backup this degenerates to a plain load of the primary.
    pub fn reconcile(&self) -> Result<StateSnapshot, StorageError> {
        let primary = load_snapshot(self.primary())?;
        let Some(backup_conn) = self.backup() else {
            return Ok(primary);
        };
        let backup = load_snapshot(backup_conn)?;
        let resolved = reconcile(primary, backup);

        self.write_snapshot(&resolved)?;
        Ok(resolved)
    }

    /// Persists a whole snapshot under the per-collection keys.
    pub fn write_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), StorageError> {
        if let Some(profile) = &snapshot.profile {
            self.set(keys::USER_PROFILE, profile)?;
        }
        self.set(keys::PAIRED_USERS, &snapshot.paired_users)?;
        self.set(keys::CHATS, &snapshot.chats)?;
        self.set(keys::MESSAGES, &snapshot.messages)?;
        self.set(keys::ANNOUNCEMENTS, &snapshot.announcements)?;
        self.set(keys::INVITES, &snapshot.invites)?;
        Ok(())
    }
}

/// Reads one side into a snapshot. A key that is missing or no longer parses
/// contributes its default, so one corrupt document never blocks recovery of
/// the rest.
fn load_snapshot(conn: &rusqlite::Connection) -> Result<StateSnapshot, StorageError> {
    Ok(StateSnapshot {
        profile: load_key(conn, keys::USER_PROFILE)?,
        paired_users: load_key(conn, keys::PAIRED_USERS)?.unwrap_or_default(),
        chats: load_key(conn, keys::CHATS)?.unwrap_or_default(),
        messages: load_key(conn, keys::MESSAGES)?.unwrap_or_default(),
        announcements: load_key(conn, keys::ANNOUNCEMENTS)?.unwrap_or_default(),
        invites: load_key(conn, keys::INVITES)?.unwrap_or_default(),
    })
}

fn load_key<T: DeserializeOwned>(
    conn: &rusqlite::Connection,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = read_raw(conn, key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "skipping unparseable value during reconciliation");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_id: &str, n: u64) -> Message {
        Message::outgoing(chat_id, "a1", "b2", "hi", n)
    }

    #[test]
    fn test_reconcile_prefers_richer_collections() {
        let mut primary = StateSnapshot::default();
        primary.paired_users = vec![PairedUser::new("b2", "Bob")];

        let mut backup = StateSnapshot::default();
        backup.paired_users = vec![
            PairedUser::new("b2", "Bob"),
            PairedUser::new("c3", "Carol"),
        ];

        let resolved = reconcile(primary, backup);
        assert_eq!(resolved.paired_users.len(), 2);
    }

    #[test]
    fn test_reconcile_resolves_keys_independently() {
        let mut primary = StateSnapshot::default();
        primary
            .messages
            .insert("a1_b2".into(), vec![message("a1_b2", 1), message("a1_b2", 2)]);

        let mut backup = StateSnapshot::default();
        backup.messages.insert("a1_b2".into(), vec![message("a1_b2", 1)]);
        backup.announcements = vec![Announcement::new("T", "c", 1)];

        let resolved = reconcile(primary, backup);
        // Primary had more messages, backup had more announcements
        assert_eq!(resolved.messages["a1_b2"].len(), 2);
        assert_eq!(resolved.announcements.len(), 1);
    }

    #[test]
    fn test_reconcile_keeps_present_profile() {
        let primary = StateSnapshot::default();
        let mut backup = StateSnapshot::default();
        backup.profile = Some(UserProfile::create("Alice", "0791234567"));

        let resolved = reconcile(primary, backup);
        assert_eq!(resolved.profile.unwrap().display_name, "Alice");
    }
}
