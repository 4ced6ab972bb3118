// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chat State Machine
//!
//! Owns the canonical `{profile, roster, chats, messages, announcements,
//! invites}` and applies every mutation atomically from the caller's point of
//! view. Purely in-memory: persistence and transport dispatch are layered on
//! by the API facade, so every invariant here is testable in isolation.

use std::collections::HashMap;

use thiserror::Error;

use super::{chat_id_for, Announcement, Chat, Message, MessageStatus, ParticipantDetails};
use crate::identity::{UserProfile, DEFAULT_AVATAR};
use crate::roster::{Invite, PairedUser, Party};

/// Precondition failures for state mutations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChatError {
    #[error("user profile not set")]
    ProfileNotSet,

    #[error("chat not found: {0}")]
    ChatNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("only the sender can edit a message")]
    NotSender,

    #[error("edit window has expired")]
    EditWindowExpired,

    #[error("messages with file attachments cannot be edited")]
    FileAttachment,
}

/// Result of a pairing attempt. Re-pairing an already-known id is a surfaced
/// condition, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Paired,
    AlreadyPaired,
}

/// Canonical application state for one installation.
#[derive(Debug, Default)]
pub struct ChatState {
    profile: Option<UserProfile>,
    paired_users: Vec<PairedUser>,
    chats: Vec<Chat>,
    messages: HashMap<String, Vec<Message>>,
    /// Newest-first.
    announcements: Vec<Announcement>,
    /// Append-only audit log, newest-first.
    invites: Vec<Invite>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from persisted collections.
    pub fn from_parts(
        profile: Option<UserProfile>,
        paired_users: Vec<PairedUser>,
        chats: Vec<Chat>,
        messages: HashMap<String, Vec<Message>>,
        announcements: Vec<Announcement>,
        invites: Vec<Invite>,
    ) -> Self {
        ChatState {
            profile,
            paired_users,
            chats,
            messages,
            announcements,
            invites,
        }
    }

    // === Accessors ===

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn paired_users(&self) -> &[PairedUser] {
        &self.paired_users
    }

    pub fn paired_user(&self, user_id: &str) -> Option<&PairedUser> {
        self.paired_users.iter().find(|p| p.user_id == user_id)
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat_by_id(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.chat_id == chat_id)
    }

    pub fn messages_for(&self, chat_id: &str) -> &[Message] {
        self.messages.get(chat_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn messages_map(&self) -> &HashMap<String, Vec<Message>> {
        &self.messages
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn invites(&self) -> &[Invite] {
        &self.invites
    }

    /// Whether the given id is the local user.
    pub fn is_local_user(&self, user_id: &str) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.user_id == user_id)
    }

    /// Resolves a user id to the record it belongs to, tagged by side.
    pub fn party(&self, user_id: &str) -> Option<Party<'_>> {
        if let Some(profile) = self.profile.as_ref() {
            if profile.user_id == user_id {
                return Some(Party::Local(profile));
            }
        }
        self.paired_user(user_id).map(Party::Remote)
    }

    // === Profile ===

    /// Sets or replaces the local profile and refreshes its snapshot in every
    /// chat that references it.
    pub fn set_profile(&mut self, profile: UserProfile) {
        for chat in &mut self.chats {
            if let Some(details) = chat.participant_details.get_mut(&profile.user_id) {
                details.display_name = profile.display_name.clone();
                details.avatar = profile.avatar.clone();
            }
        }
        self.profile = Some(profile);
    }

    // === Pairing ===

    /// Pairs with a remote identity. Idempotent: an already-paired id is a
    /// safe no-op reported as [`PairOutcome::AlreadyPaired`].
    ///
    /// A new pairing appends exactly one audit [`Invite`] and one
    /// [`PairedUser`].
    pub fn pair(
        &mut self,
        user_id: &str,
        display_name: &str,
        timestamp: u64,
    ) -> Result<PairOutcome, ChatError> {
        let profile = self.profile.as_ref().ok_or(ChatError::ProfileNotSet)?;

        if self.paired_users.iter().any(|p| p.user_id == user_id) {
            return Ok(PairOutcome::AlreadyPaired);
        }

        let invite = Invite::accepted(
            &profile.user_id,
            user_id,
            &profile.display_name,
            display_name,
            timestamp,
        );
        self.invites.insert(0, invite);
        self.paired_users.push(PairedUser::new(user_id, display_name));

        Ok(PairOutcome::Paired)
    }

    /// Removes a paired user. Chats with this user are kept so history
    /// survives unpairing.
    pub fn remove_paired_user(&mut self, user_id: &str) -> bool {
        let before = self.paired_users.len();
        self.paired_users.retain(|p| p.user_id != user_id);
        before != self.paired_users.len()
    }

    /// Sets the local display-name override for a paired user and rewrites
    /// the name snapshot in every chat they participate in.
    pub fn rename_paired_user(&mut self, user_id: &str, local_name: &str) -> bool {
        let Some(user) = self
            .paired_users
            .iter_mut()
            .find(|p| p.user_id == user_id)
        else {
            return false;
        };
        user.local_display_name = Some(local_name.to_string());

        for chat in &mut self.chats {
            if chat.participants.iter().any(|p| p == user_id) {
                if let Some(details) = chat.participant_details.get_mut(user_id) {
                    details.display_name = local_name.to_string();
                }
            }
        }
        true
    }

    // === Chats ===

    /// Creates the chat for the local user and `participant_id`, or returns
    /// the existing one.
    ///
    /// Idempotent: the chat id is a pure function of the unordered pair, and
    /// an existing chat is reconciled (participant snapshots refreshed,
    /// pending flag cleared) rather than duplicated. Eagerly initializes an
    /// empty message list for the chat.
    pub fn create_or_get_chat(
        &mut self,
        participant_id: &str,
        participant_name: &str,
        participant_avatar: Option<&str>,
    ) -> Result<&Chat, ChatError> {
        let profile = self.profile.as_ref().ok_or(ChatError::ProfileNotSet)?;
        let local_id = profile.user_id.clone();
        let local_name = profile.display_name.clone();
        let local_avatar = profile.avatar.clone();

        let chat_id = chat_id_for(&local_id, participant_id);
        self.messages.entry(chat_id.clone()).or_default();

        // A paired-list entry wins over caller-supplied details
        let (effective_name, effective_avatar) = match self.party(participant_id) {
            Some(party @ Party::Remote(_)) => {
                (party.display_name().to_string(), party.avatar().to_string())
            }
            _ => (
                participant_name.to_string(),
                participant_avatar.unwrap_or(DEFAULT_AVATAR).to_string(),
            ),
        };

        if let Some(idx) = self.chats.iter().position(|c| c.chat_id == chat_id) {
            let chat = &mut self.chats[idx];
            chat.participant_details.insert(
                local_id.clone(),
                ParticipantDetails {
                    display_name: local_name,
                    avatar: local_avatar,
                },
            );
            chat.participant_details.insert(
                participant_id.to_string(),
                ParticipantDetails {
                    display_name: effective_name,
                    avatar: effective_avatar,
                },
            );
            chat.is_pending = false;
            return Ok(&self.chats[idx]);
        }

        let mut participants = [local_id.clone(), participant_id.to_string()];
        participants.sort();

        let mut participant_details = HashMap::new();
        participant_details.insert(
            local_id,
            ParticipantDetails {
                display_name: local_name,
                avatar: local_avatar,
            },
        );
        participant_details.insert(
            participant_id.to_string(),
            ParticipantDetails {
                display_name: effective_name,
                avatar: effective_avatar,
            },
        );

        self.chats.push(Chat {
            chat_id,
            participants,
            participant_details,
            last_message: None,
            unread_count: 0,
            is_pending: true,
        });
        Ok(self.chats.last().expect("chat just pushed"))
    }

    // === Messages ===

    /// Appends a message to its chat.
    ///
    /// Deduplicates by `message_id` (a duplicate is a no-op returning
    /// `false`). Updates the chat's `last_message`, clears `is_pending`, and
    /// increments `unread_count` only when the sender is not the local user.
    pub fn add_message(&mut self, message: Message) -> Result<bool, ChatError> {
        let chat_idx = self
            .chats
            .iter()
            .position(|c| c.chat_id == message.chat_id)
            .ok_or_else(|| ChatError::ChatNotFound(message.chat_id.clone()))?;

        let list = self.messages.entry(message.chat_id.clone()).or_default();
        if list.iter().any(|m| m.message_id == message.message_id) {
            return Ok(false);
        }

        let from_local = self
            .profile
            .as_ref()
            .is_some_and(|p| p.user_id == message.sender_id);

        list.push(message.clone());

        let chat = &mut self.chats[chat_idx];
        chat.last_message = Some(message);
        chat.is_pending = false;
        if !from_local {
            chat.unread_count += 1;
        }

        Ok(true)
    }

    /// Applies a delivery-status transition.
    ///
    /// Monotonic: a status that does not advance the stored one is ignored
    /// (duplicate or out-of-order receipts are no-ops). Returns whether the
    /// stored status changed. Unknown chat/message ids are ignored rather
    /// than failed, since transports may replay stale receipts.
    pub fn update_message_status(
        &mut self,
        chat_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> bool {
        let Some(list) = self.messages.get_mut(chat_id) else {
            return false;
        };
        let Some(msg) = list.iter_mut().find(|m| m.message_id == message_id) else {
            return false;
        };

        if !msg.status.can_advance_to(status) {
            return false;
        }
        msg.status = status;

        // Keep the denormalized pointer in step
        if let Some(chat) = self.chats.iter_mut().find(|c| c.chat_id == chat_id) {
            if let Some(last) = chat.last_message.as_mut() {
                if last.message_id == message_id {
                    last.status = status;
                }
            }
        }
        true
    }

    /// Edits a message's text.
    ///
    /// Allowed only for the original sender, only within the edit window, and
    /// never for messages carrying a file attachment. `now` is milliseconds
    /// since the Unix epoch.
    pub fn edit_message(
        &mut self,
        chat_id: &str,
        message_id: &str,
        new_text: &str,
        editor_id: &str,
        now: u64,
    ) -> Result<(), ChatError> {
        let list = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| ChatError::ChatNotFound(chat_id.to_string()))?;
        let msg = list
            .iter_mut()
            .find(|m| m.message_id == message_id)
            .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;

        if msg.sender_id != editor_id {
            return Err(ChatError::NotSender);
        }
        if msg.file.is_some() {
            return Err(ChatError::FileAttachment);
        }
        if !msg.within_edit_window(now) {
            return Err(ChatError::EditWindowExpired);
        }

        msg.text = new_text.to_string();
        msg.edited = true;

        if let Some(chat) = self.chats.iter_mut().find(|c| c.chat_id == chat_id) {
            if let Some(last) = chat.last_message.as_mut() {
                if last.message_id == message_id {
                    last.text = new_text.to_string();
                    last.edited = true;
                }
            }
        }
        Ok(())
    }

    /// Hides a message from the local viewer only. The other participant's
    /// copy is unaffected.
    pub fn delete_message_for_me(
        &mut self,
        chat_id: &str,
        message_id: &str,
    ) -> Result<(), ChatError> {
        self.delete_message(chat_id, message_id, DeletionKind::ForMe)
    }

    /// Redacts a message for all participants. The record persists for audit
    /// by a privileged viewer, but its content must not render for anyone.
    pub fn delete_message_for_everyone(
        &mut self,
        chat_id: &str,
        message_id: &str,
    ) -> Result<(), ChatError> {
        self.delete_message(chat_id, message_id, DeletionKind::ForEveryone)
    }

    fn delete_message(
        &mut self,
        chat_id: &str,
        message_id: &str,
        kind: DeletionKind,
    ) -> Result<(), ChatError> {
        let list = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| ChatError::ChatNotFound(chat_id.to_string()))?;
        let msg = list
            .iter_mut()
            .find(|m| m.message_id == message_id)
            .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;

        match kind {
            DeletionKind::ForMe => msg.deleted_for_me = true,
            DeletionKind::ForEveryone => msg.deleted_for_everyone = true,
        }

        // If this was the denormalized last message, fall back to the most
        // recent message not excluded by the same flag.
        let replacement = list
            .iter()
            .rev()
            .find(|m| {
                m.message_id != message_id
                    && match kind {
                        DeletionKind::ForMe => !m.deleted_for_me,
                        DeletionKind::ForEveryone => !m.deleted_for_everyone,
                    }
            })
            .cloned();

        if let Some(chat) = self.chats.iter_mut().find(|c| c.chat_id == chat_id) {
            if chat
                .last_message
                .as_ref()
                .is_some_and(|last| last.message_id == message_id)
            {
                chat.last_message = replacement;
            }
        }
        Ok(())
    }

    /// Removes the entire message history of a chat. The chat record itself
    /// survives with reset counters.
    pub fn clear_chat_messages(&mut self, chat_id: &str) -> Result<(), ChatError> {
        let chat = self
            .chats
            .iter_mut()
            .find(|c| c.chat_id == chat_id)
            .ok_or_else(|| ChatError::ChatNotFound(chat_id.to_string()))?;

        self.messages.insert(chat_id.to_string(), Vec::new());
        chat.last_message = None;
        chat.unread_count = 0;
        Ok(())
    }

    /// Resets the unread counter. Individual message statuses are untouched.
    pub fn mark_chat_as_read(&mut self, chat_id: &str) -> Result<(), ChatError> {
        let chat = self
            .chats
            .iter_mut()
            .find(|c| c.chat_id == chat_id)
            .ok_or_else(|| ChatError::ChatNotFound(chat_id.to_string()))?;
        chat.unread_count = 0;
        Ok(())
    }

    // === Announcements ===

    /// Prepends an announcement, keeping newest-first order. Deduplicates by
    /// id so a broadcast arriving over both transports lands once.
    pub fn push_announcement(&mut self, announcement: Announcement) -> bool {
        if self.announcements.iter().any(|a| a.id == announcement.id) {
            return false;
        }
        self.announcements.insert(0, announcement);
        true
    }

    pub fn mark_announcement_read(&mut self, id: &str) -> bool {
        match self.announcements.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.read = true;
                true
            }
            None => false,
        }
    }

    pub fn delete_announcement(&mut self, id: &str) -> bool {
        let before = self.announcements.len();
        self.announcements.retain(|a| a.id != id);
        before != self.announcements.len()
    }

    // === Reset ===

    /// Drops all local data. Used by the settings "clear all" flow.
    pub fn clear_all(&mut self) {
        *self = ChatState::new();
    }
}

#[derive(Clone, Copy)]
enum DeletionKind {
    ForMe,
    ForEveryone,
}
