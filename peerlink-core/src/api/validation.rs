// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Input Validation
//!
//! Bounds for user-supplied values, enforced at the API boundary. Counts are
//! in characters, not bytes.

use thiserror::Error;

/// Validation error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("display name must be {DISPLAY_NAME_MIN}-{DISPLAY_NAME_MAX} characters")]
    DisplayName,

    #[error("local display name must be {LOCAL_NAME_MIN}-{LOCAL_NAME_MAX} characters")]
    LocalDisplayName,

    #[error("phone number must be {PHONE_DIGITS_MIN}-{PHONE_DIGITS_MAX} digits, optionally prefixed with +")]
    PhoneNumber,

    #[error("message must be {MESSAGE_MIN}-{MESSAGE_MAX} characters")]
    MessageText,

    #[error("announcement title must be {TITLE_MIN}-{TITLE_MAX} characters")]
    AnnouncementTitle,

    #[error("announcement content must be {CONTENT_MIN}-{CONTENT_MAX} characters")]
    AnnouncementContent,

    #[error("invite link must start with the invite prefix")]
    InviteLinkPrefix,

    #[error("invite link must carry a v4 UUID user id")]
    InviteLinkUserId,
}

pub const DISPLAY_NAME_MIN: usize = 3;
pub const DISPLAY_NAME_MAX: usize = 20;
pub const LOCAL_NAME_MIN: usize = 1;
pub const LOCAL_NAME_MAX: usize = 30;
pub const PHONE_DIGITS_MIN: usize = 10;
pub const PHONE_DIGITS_MAX: usize = 15;
pub const MESSAGE_MIN: usize = 1;
pub const MESSAGE_MAX: usize = 1000;
pub const TITLE_MIN: usize = 1;
pub const TITLE_MAX: usize = 100;
pub const CONTENT_MIN: usize = 1;
pub const CONTENT_MAX: usize = 2000;

/// Validates a profile display name.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if (DISPLAY_NAME_MIN..=DISPLAY_NAME_MAX).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::DisplayName)
    }
}

/// Validates a local rename of a paired user.
pub fn validate_local_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if (LOCAL_NAME_MIN..=LOCAL_NAME_MAX).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::LocalDisplayName)
    }
}

/// Validates a phone number: an optional leading `+` followed only by
/// digits, 10 to 15 of them.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PhoneNumber);
    }
    if (PHONE_DIGITS_MIN..=PHONE_DIGITS_MAX).contains(&digits.len()) {
        Ok(())
    } else {
        Err(ValidationError::PhoneNumber)
    }
}

/// Validates message body text. An empty body is allowed when a file is
/// attached (the text is then only a caption).
pub fn validate_message_text(text: &str, has_file: bool) -> Result<(), ValidationError> {
    let len = text.chars().count();
    if len == 0 && has_file {
        return Ok(());
    }
    if (MESSAGE_MIN..=MESSAGE_MAX).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::MessageText)
    }
}

/// Validates announcement title and content.
pub fn validate_announcement(title: &str, content: &str) -> Result<(), ValidationError> {
    let title_len = title.trim().chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&title_len) {
        return Err(ValidationError::AnnouncementTitle);
    }
    let content_len = content.trim().chars().count();
    if !(CONTENT_MIN..=CONTENT_MAX).contains(&content_len) {
        return Err(ValidationError::AnnouncementContent);
    }
    Ok(())
}
