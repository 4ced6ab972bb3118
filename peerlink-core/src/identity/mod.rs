// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local Identity
//!
//! The local installation's user profile and the invite link derived from it.
//! The `user_id` is generated once at onboarding and is immutable for the
//! lifetime of the installation; the display name can change via settings.

mod invite_link;

pub use invite_link::{InviteLink, INVITE_LINK_PREFIX};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default avatar shown for every user (inline SVG data URI).
pub const DEFAULT_AVATAR: &str = "data:image/svg+xml;utf8,%3Csvg%20width%3D%2224%22%20height%3D%2224%22%20viewBox%3D%220%200%2024%2024%22%20fill%3D%22none%22%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%3E%3Cpath%20d%3D%22M12%2012C14.2091%2012%2016%2010.2091%2016%208C16%205.79086%2014.2091%204%2012%204C9.79086%204%208%205.79086%208%208C8%2010.2091%209.79086%2012%2012%2012Z%22%20fill%3D%22currentColor%22%2F%3E%3Cpath%20d%3D%22M20%2019C20%2016.7909%2016.4183%2015%2012%2015C7.58172%2015%204%2016.7909%204%2019V20H20V19Z%22%20fill%3D%22currentColor%22%2F%3E%3C%2Fsvg%3E";

/// The local user's profile.
///
/// Created at onboarding. `user_id` and `invite_link` are derived together
/// and never change; `display_name` is mutable through the settings flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub phone_number: String,
    pub invite_link: String,
    pub avatar: String,
}

impl UserProfile {
    /// Creates a fresh profile with a newly generated identity.
    ///
    /// Validation of the display name and phone number happens at the API
    /// boundary before this is called.
    pub fn create(display_name: &str, phone_number: &str) -> Self {
        let user_id = Uuid::new_v4().to_string();
        let invite_link = InviteLink::for_user(&user_id);

        UserProfile {
            user_id,
            display_name: display_name.to_string(),
            phone_number: phone_number.to_string(),
            invite_link: invite_link.to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }

    /// Updates the display name, keeping identity fields untouched.
    pub fn set_display_name(&mut self, name: &str) {
        self.display_name = name.to_string();
    }
}
