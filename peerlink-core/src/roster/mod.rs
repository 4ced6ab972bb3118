// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Roster
//!
//! Paired users and the append-only pairing audit log. Pairing is
//! bidirectional with no approval step: accepting an invite on either side
//! makes the two identities mutually known.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{UserProfile, DEFAULT_AVATAR};

/// A user this installation has paired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedUser {
    pub user_id: String,
    /// Original name from pairing; immutable once paired.
    pub display_name: String,
    /// Optional override set locally by the current user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_display_name: Option<String>,
    pub avatar: String,
}

impl PairedUser {
    /// Creates a freshly paired user with the default avatar and no local
    /// rename.
    pub fn new(user_id: &str, display_name: &str) -> Self {
        PairedUser {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            local_display_name: None,
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }

    /// The name the local user sees: the local override if set, otherwise the
    /// original pairing name.
    pub fn effective_name(&self) -> &str {
        self.local_display_name
            .as_deref()
            .unwrap_or(&self.display_name)
    }
}

/// Audit record of a pairing event. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: String,
    pub inviter_id: String,
    pub invitee_id: String,
    pub inviter_name: String,
    pub invitee_name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub accepted: bool,
}

impl Invite {
    /// Records an accepted pairing between the two named identities.
    pub fn accepted(
        inviter_id: &str,
        invitee_id: &str,
        inviter_name: &str,
        invitee_name: &str,
        timestamp: u64,
    ) -> Self {
        Invite {
            id: Uuid::new_v4().to_string(),
            inviter_id: inviter_id.to_string(),
            invitee_id: invitee_id.to_string(),
            inviter_name: inviter_name.to_string(),
            invitee_name: invitee_name.to_string(),
            timestamp,
            accepted: true,
        }
    }
}

/// A chat participant, tagged by which side of the installation it lives on.
///
/// Replaces field-presence sniffing on profile-vs-paired records: each variant
/// carries only the record it actually is.
#[derive(Debug, Clone)]
pub enum Party<'a> {
    Local(&'a UserProfile),
    Remote(&'a PairedUser),
}

impl Party<'_> {
    pub fn user_id(&self) -> &str {
        match self {
            Party::Local(p) => &p.user_id,
            Party::Remote(p) => &p.user_id,
        }
    }

    /// Display name as the local user should see it (local rename wins for
    /// remote parties).
    pub fn display_name(&self) -> &str {
        match self {
            Party::Local(p) => &p.display_name,
            Party::Remote(p) => p.effective_name(),
        }
    }

    pub fn avatar(&self) -> &str {
        match self {
            Party::Local(p) => &p.avatar,
            Party::Remote(p) => &p.avatar,
        }
    }
}
