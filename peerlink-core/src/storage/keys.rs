// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Well-known keys of the key-value store.
//!
//! One key per top-level collection; values are JSON documents. Key names are
//! part of the on-disk format and must never change once shipped.

pub const USER_PROFILE: &str = "user-profile";
pub const PAIRED_USERS: &str = "paired-users";
pub const CHATS: &str = "chats";
pub const MESSAGES: &str = "messages";
pub const ANNOUNCEMENTS: &str = "announcements";
pub const INVITES: &str = "invites";
pub const LAST_SEEN_ANNOUNCEMENT_ID: &str = "last-seen-announcement-id";

/// Every key the reconciliation pass considers.
pub const ALL_KEYS: &[&str] = &[
    USER_PROFILE,
    PAIRED_USERS,
    CHATS,
    MESSAGES,
    ANNOUNCEMENTS,
    INVITES,
    LAST_SEEN_ANNOUNCEMENT_ID,
];
