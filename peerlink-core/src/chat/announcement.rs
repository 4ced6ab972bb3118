// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Announcements
//!
//! Broadcast notices, not addressed to any chat. Ordered newest-first.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A broadcast announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub date: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read: bool,
}

impl Announcement {
    /// Creates a new unread announcement with a generated id.
    pub fn new(title: &str, content: &str, date: u64) -> Self {
        Announcement {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            date,
            read: false,
        }
    }
}
