// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Invite Link Format
//!
//! An invite link is `peerlink://invite/<user_id>` where the id must be a
//! well-formed version-4 UUID. Parsing rejects anything else before pairing
//! proceeds.

use std::fmt;

use uuid::Uuid;

use crate::api::ValidationError;

/// Scheme + path prefix every invite link must carry.
pub const INVITE_LINK_PREFIX: &str = "peerlink://invite/";

/// A validated invite link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteLink {
    user_id: String,
}

impl InviteLink {
    /// Builds the invite link for a user id (assumed valid, locally generated).
    pub fn for_user(user_id: &str) -> Self {
        InviteLink {
            user_id: user_id.to_string(),
        }
    }

    /// Parses and validates an invite link received out-of-band.
    ///
    /// Rejects a missing/incorrect prefix and a malformed or non-v4 UUID with
    /// distinct validation errors.
    pub fn parse(link: &str) -> Result<Self, ValidationError> {
        let link = link.trim();
        let Some(candidate) = link.strip_prefix(INVITE_LINK_PREFIX) else {
            return Err(ValidationError::InviteLinkPrefix);
        };

        let uuid = Uuid::parse_str(candidate).map_err(|_| ValidationError::InviteLinkUserId)?;
        if uuid.get_version_num() != 4 {
            return Err(ValidationError::InviteLinkUserId);
        }

        Ok(InviteLink {
            user_id: candidate.to_ascii_lowercase(),
        })
    }

    /// The user id carried by the link.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl fmt::Display for InviteLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", INVITE_LINK_PREFIX, self.user_id)
    }
}
