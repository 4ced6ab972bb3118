// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! PeerLink Orchestrator
//!
//! Main entry point for the PeerLink API. Coordinates the chat state
//! machine, persistence, the relay client, and direct peer sessions, and
//! implements the peer-first/relay-fallback dispatch policy for outbound
//! messages.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::chat::{
    now_millis, Announcement, Chat, ChatState, Message, MessageFile, MessageStatus, PairOutcome,
};
use crate::identity::{InviteLink, UserProfile};
use crate::network::{
    BroadcastAuth, ConnectionState, MockTransport, ReadReceipt, RelayClient, RelayEvent, Transport,
};
use crate::peer::{PeerChannel, PeerFrame, PeerTransport};
use crate::roster::{Invite, PairedUser};
use crate::storage::Store;

use super::config::AppConfig;
use super::error::{AppError, AppResult};
use super::events::{AppEvent, CallbackHandler, EventDispatcher, EventHandler};
use super::validation;

/// Main PeerLink orchestrator.
///
/// # Example
///
/// ```ignore
/// use peerlink_core::api::{AppConfig, PeerLink};
///
/// let mut app = PeerLink::new(AppConfig::default())?;
/// app.create_profile("Alice", "0791234567")?;
///
/// app.add_event_handler(Arc::new(CallbackHandler::new(|event| {
///     println!("event: {event:?}");
/// })));
///
/// app.connect()?;
/// app.send_message("their-user-id", "hello")?;
/// app.process_incoming()?;
/// ```
pub struct PeerLink<T: Transport = MockTransport> {
    config: AppConfig,
    store: Store,
    state: ChatState,
    /// Created on first connect, once a profile exists to register.
    relay: Option<RelayClient<T>>,
    /// Transport held until the relay client is built.
    pending_transport: Option<T>,
    /// Created together with the profile.
    peers: Option<PeerTransport>,
    events: EventDispatcher,
    /// Users the relay currently reports online.
    online_users: HashSet<String>,
}

impl PeerLink<MockTransport> {
    /// Creates a PeerLink instance with a mock transport (for testing).
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_transport(MockTransport::new(), config)
    }
}

impl<T: Transport> PeerLink<T> {
    /// Creates a PeerLink instance with the given relay transport.
    pub fn with_transport(transport: T, config: AppConfig) -> AppResult<Self> {
        if let Some(parent) = config.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Configuration(e.to_string()))?;
            }
        }
        let backup_path = config.effective_backup_path();
        let store = Store::open(&config.storage_path, &backup_path)?;
        Self::with_store(transport, config, store)
    }

    /// Creates a PeerLink instance with in-memory storage (for testing).
    pub fn in_memory(transport: T) -> AppResult<Self> {
        Self::with_store(transport, AppConfig::default(), Store::in_memory()?)
    }

    /// In-memory storage with an explicit configuration (for testing).
    pub fn in_memory_with_config(transport: T, config: AppConfig) -> AppResult<Self> {
        Self::with_store(transport, config, Store::in_memory()?)
    }

    fn with_store(transport: T, config: AppConfig, store: Store) -> AppResult<Self> {
        let state = store.load_state()?;
        let peers = state.profile().map(|p| {
            PeerTransport::with_timeout(&p.user_id, config.peer.negotiation_timeout_ms)
        });

        Ok(PeerLink {
            config,
            store,
            state,
            relay: None,
            pending_transport: Some(transport),
            peers,
            events: EventDispatcher::new(),
            online_users: HashSet::new(),
        })
    }

    // === Events ===

    /// Adds an event handler.
    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Adds a closure as event handler.
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(Arc::new(CallbackHandler::new(callback)));
    }

    // === Profile ===

    /// Creates the local profile. Fails if one already exists.
    pub fn create_profile(&mut self, display_name: &str, phone_number: &str) -> AppResult<UserProfile> {
        if self.state.profile().is_some() {
            return Err(AppError::AlreadyInitialized);
        }
        validation::validate_display_name(display_name)?;
        validation::validate_phone_number(phone_number)?;

        let profile = UserProfile::create(display_name.trim(), phone_number.trim());
        self.peers = Some(PeerTransport::with_timeout(
            &profile.user_id,
            self.config.peer.negotiation_timeout_ms,
        ));
        self.state.set_profile(profile.clone());
        self.persist();
        Ok(profile)
    }

    /// Returns the local profile, if created.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.state.profile()
    }

    /// Changes the local display name. The invite link and user id are
    /// untouched.
    pub fn set_display_name(&mut self, display_name: &str) -> AppResult<()> {
        validation::validate_display_name(display_name)?;
        let mut profile = self
            .state
            .profile()
            .cloned()
            .ok_or(AppError::ProfileNotInitialized)?;
        profile.set_display_name(display_name.trim());
        self.state.set_profile(profile);
        self.persist();
        Ok(())
    }

    /// The local user's invite link.
    pub fn invite_link(&self) -> AppResult<String> {
        self.state
            .profile()
            .map(|p| p.invite_link.clone())
            .ok_or(AppError::ProfileNotInitialized)
    }

    // === Pairing ===

    /// Accepts an invite link, pairing with its owner. Idempotent: pairing
    /// twice with the same user is a no-op reported in the outcome.
    pub fn accept_invite(&mut self, link: &str, inviter_name: &str) -> AppResult<PairOutcome> {
        let link = InviteLink::parse(link)?;
        validation::validate_display_name(inviter_name)?;

        let profile = self.state.profile().ok_or(AppError::ProfileNotInitialized)?;
        if link.user_id() == profile.user_id {
            return Err(AppError::InvalidState("cannot pair with yourself".into()));
        }

        let outcome = self
            .state
            .pair(link.user_id(), inviter_name.trim(), now_millis())?;
        self.state
            .create_or_get_chat(link.user_id(), inviter_name.trim(), None)?;
        self.persist();

        if outcome == PairOutcome::Paired {
            self.events.dispatch(AppEvent::PairedUserAdded {
                user_id: link.user_id().to_string(),
            });
        }
        Ok(outcome)
    }

    /// Removes a paired user and closes any direct session with them. Chat
    /// history is preserved.
    pub fn remove_paired_user(&mut self, user_id: &str) -> AppResult<()> {
        if !self.state.remove_paired_user(user_id) {
            return Err(AppError::NotPaired(user_id.to_string()));
        }
        if let Some(peers) = self.peers.as_mut() {
            peers.disconnect(user_id);
        }
        self.persist();
        Ok(())
    }

    /// Sets a local display-name override for a paired user.
    pub fn rename_paired_user(&mut self, user_id: &str, local_name: &str) -> AppResult<()> {
        validation::validate_local_display_name(local_name)?;
        if !self.state.rename_paired_user(user_id, local_name.trim()) {
            return Err(AppError::NotPaired(user_id.to_string()));
        }
        self.persist();
        Ok(())
    }

    pub fn paired_users(&self) -> &[PairedUser] {
        self.state.paired_users()
    }

    pub fn invites(&self) -> &[Invite] {
        self.state.invites()
    }

    // === Relay connection ===

    /// Connects to the relay and registers the local user id.
    pub fn connect(&mut self) -> AppResult<()> {
        let user_id = self
            .state
            .profile()
            .map(|p| p.user_id.clone())
            .ok_or(AppError::ProfileNotInitialized)?;

        let relay = match self.relay.as_mut() {
            Some(relay) => relay,
            None => {
                let transport = self
                    .pending_transport
                    .take()
                    .ok_or_else(|| AppError::InvalidState("transport already consumed".into()))?;
                self.relay.insert(RelayClient::new(
                    transport,
                    self.config.relay.to_client_config(),
                    user_id,
                ))
            }
        };

        relay.connect()?;
        self.events.dispatch(AppEvent::ConnectionStateChanged {
            state: ConnectionState::Connected,
        });
        Ok(())
    }

    /// Disconnects from the relay.
    pub fn disconnect(&mut self) -> AppResult<()> {
        if let Some(relay) = self.relay.as_mut() {
            relay.disconnect()?;
            self.online_users.clear();
            self.events.dispatch(AppEvent::ConnectionStateChanged {
                state: ConnectionState::Disconnected,
            });
        }
        Ok(())
    }

    /// Whether the relay connection is up.
    pub fn is_connected(&self) -> bool {
        self.relay.as_ref().is_some_and(|r| r.is_connected())
    }

    /// Whether the relay currently reports `user_id` online.
    pub fn is_online(&self, user_id: &str) -> bool {
        self.online_users.contains(user_id)
    }

    // === Peer sessions ===

    /// Starts a direct connection to a paired user. Returns the offer blob
    /// to hand to the other side out of band.
    pub fn connect_peer(&mut self, peer_id: &str) -> AppResult<String> {
        if self.state.paired_user(peer_id).is_none() {
            return Err(AppError::NotPaired(peer_id.to_string()));
        }
        let offer = self.peers_mut()?.create_offer(peer_id, now_millis())?;
        Ok(offer)
    }

    /// Accepts a peer offer, binding `channel` to the new session. Returns
    /// the answer blob to hand back.
    pub fn accept_peer_offer(
        &mut self,
        offer_blob: &str,
        channel: Box<dyn PeerChannel>,
    ) -> AppResult<String> {
        let (answer, peer_id) = self
            .peers_mut()?
            .accept_offer(offer_blob, channel, now_millis())?;
        self.send_identity_frame(&peer_id);
        self.events.dispatch(AppEvent::PeerConnected { user_id: peer_id });
        Ok(answer)
    }

    /// Completes the handshake on the initiating side with the peer's
    /// answer blob.
    pub fn complete_peer_connection(
        &mut self,
        answer_blob: &str,
        channel: Box<dyn PeerChannel>,
    ) -> AppResult<String> {
        let peer_id = self.peers_mut()?.apply_answer(answer_blob, channel)?;
        self.send_identity_frame(&peer_id);
        self.events.dispatch(AppEvent::PeerConnected {
            user_id: peer_id.clone(),
        });
        Ok(peer_id)
    }

    /// Whether a direct session with `peer_id` is open.
    pub fn is_peer_connected(&self, peer_id: &str) -> bool {
        self.peers
            .as_ref()
            .is_some_and(|p| p.is_connected_to(peer_id))
    }

    /// Ids of all peers with an open direct session.
    pub fn connected_peers(&self) -> Vec<String> {
        self.peers
            .as_ref()
            .map(|p| p.connected_peers())
            .unwrap_or_default()
    }

    /// Closes the direct session with `peer_id`, if any.
    pub fn disconnect_peer(&mut self, peer_id: &str) {
        if let Some(peers) = self.peers.as_mut() {
            peers.disconnect(peer_id);
            self.events.dispatch(AppEvent::PeerDisconnected {
                user_id: peer_id.to_string(),
            });
        }
    }

    /// Abandons stale peer negotiations. Returns the peer ids that timed
    /// out.
    pub fn check_peer_timeouts(&mut self) -> Vec<String> {
        let Some(peers) = self.peers.as_mut() else {
            return Vec::new();
        };
        let timed_out = peers.check_timeouts(now_millis());
        for peer_id in &timed_out {
            self.events.dispatch(AppEvent::PeerDisconnected {
                user_id: peer_id.clone(),
            });
        }
        timed_out
    }

    fn peers_mut(&mut self) -> AppResult<&mut PeerTransport> {
        self.peers.as_mut().ok_or(AppError::ProfileNotInitialized)
    }

    fn send_identity_frame(&mut self, peer_id: &str) {
        let Some(profile) = self.state.profile() else {
            return;
        };
        let frame = PeerFrame::Identity {
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
        };
        if let Some(peers) = self.peers.as_mut() {
            if !peers.send_frame(peer_id, &frame) {
                warn!(peer_id, "identity frame not delivered");
            }
        }
    }

    // === Messaging ===

    /// Sends a text message to a paired user.
    pub fn send_message(&mut self, receiver_id: &str, text: &str) -> AppResult<Message> {
        self.send_message_inner(receiver_id, text, None, None)
    }

    /// Sends a message with a file descriptor attached. `caption` may be
    /// empty.
    pub fn send_file_message(
        &mut self,
        receiver_id: &str,
        caption: &str,
        file: MessageFile,
    ) -> AppResult<Message> {
        self.send_message_inner(receiver_id, caption, Some(file), None)
    }

    /// Sends a text message replying to an earlier message in the same
    /// chat.
    pub fn send_reply(
        &mut self,
        receiver_id: &str,
        text: &str,
        reply_to_id: &str,
    ) -> AppResult<Message> {
        self.send_message_inner(receiver_id, text, None, Some(reply_to_id))
    }

    fn send_message_inner(
        &mut self,
        receiver_id: &str,
        text: &str,
        file: Option<MessageFile>,
        reply_to_id: Option<&str>,
    ) -> AppResult<Message> {
        validation::validate_message_text(text, file.is_some())?;

        let profile = self.state.profile().ok_or(AppError::ProfileNotInitialized)?;
        let sender_id = profile.user_id.clone();
        let paired = self
            .state
            .paired_user(receiver_id)
            .ok_or_else(|| AppError::NotPaired(receiver_id.to_string()))?;
        let receiver_name = paired.effective_name().to_string();

        let chat_id = self
            .state
            .create_or_get_chat(receiver_id, &receiver_name, None)?
            .chat_id
            .clone();

        let mut message = Message::outgoing(&chat_id, &sender_id, receiver_id, text, now_millis());
        if let Some(file) = file {
            message = message.with_file(file);
        }
        if let Some(reply_to) = reply_to_id {
            message = message.in_reply_to(reply_to);
        }
        self.state.add_message(message.clone())?;

        let final_status = self.dispatch_outbound(&message);
        if let Some(status) = final_status {
            self.state
                .update_message_status(&chat_id, &message.message_id, status);
            message.status = status;
        }
        self.persist();
        Ok(message)
    }

    /// Tries the direct peer path first, then the relay. Returns a status
    /// override: `Delivered` after a successful peer send (the channel is
    /// point-to-point), `Failed` when no path worked, `None` when the relay
    /// accepted the message and a receipt will follow.
    fn dispatch_outbound(&mut self, message: &Message) -> Option<MessageStatus> {
        let receiver_id = message.receiver_id.as_str();

        if let Some(peers) = self.peers.as_mut() {
            if peers.is_connected_to(receiver_id) {
                let frame = PeerFrame::Message {
                    message: message.clone(),
                };
                if peers.send_frame(receiver_id, &frame) {
                    self.events.dispatch(AppEvent::MessageStatusChanged {
                        chat_id: message.chat_id.clone(),
                        message_id: message.message_id.clone(),
                        status: MessageStatus::Delivered,
                    });
                    return Some(MessageStatus::Delivered);
                }
                warn!(receiver_id, "peer send failed, falling back to relay");
            }
        }

        if let Some(relay) = self.relay.as_mut() {
            match relay.send_message(message) {
                Ok(_) => return None,
                Err(e) => {
                    warn!(receiver_id, error = %e, "relay send failed");
                }
            }
        }

        self.events.dispatch(AppEvent::MessageFailed {
            chat_id: message.chat_id.clone(),
            message_id: message.message_id.clone(),
            error: "no delivery path available".into(),
        });
        Some(MessageStatus::Failed)
    }

    /// Edits one of the local user's own messages, within the edit window.
    pub fn edit_message(
        &mut self,
        chat_id: &str,
        message_id: &str,
        new_text: &str,
    ) -> AppResult<()> {
        validation::validate_message_text(new_text, false)?;
        let editor_id = self
            .state
            .profile()
            .map(|p| p.user_id.clone())
            .ok_or(AppError::ProfileNotInitialized)?;
        self.state
            .edit_message(chat_id, message_id, new_text, &editor_id, now_millis())?;
        self.persist();
        Ok(())
    }

    /// Hides a message from this installation only.
    pub fn delete_message_for_me(&mut self, chat_id: &str, message_id: &str) -> AppResult<()> {
        self.state.delete_message_for_me(chat_id, message_id)?;
        self.persist();
        Ok(())
    }

    /// Redacts a message for all participants.
    pub fn delete_message_for_everyone(
        &mut self,
        chat_id: &str,
        message_id: &str,
    ) -> AppResult<()> {
        self.state.delete_message_for_everyone(chat_id, message_id)?;
        self.persist();
        Ok(())
    }

    /// Clears a chat's message history, keeping the chat itself.
    pub fn clear_chat(&mut self, chat_id: &str) -> AppResult<()> {
        self.state.clear_chat_messages(chat_id)?;
        self.persist();
        Ok(())
    }

    /// Marks a chat read: resets the unread counter, advances the other
    /// party's messages to `Read` locally, and sends read receipts for them
    /// when the relay is up.
    pub fn mark_chat_read(&mut self, chat_id: &str) -> AppResult<()> {
        let reader_id = self
            .state
            .profile()
            .map(|p| p.user_id.clone())
            .ok_or(AppError::ProfileNotInitialized)?;
        self.state.mark_chat_as_read(chat_id)?;

        let unread: Vec<(String, String)> = self
            .state
            .messages_for(chat_id)
            .iter()
            .filter(|m| m.sender_id != reader_id && m.status != MessageStatus::Read)
            .map(|m| (m.message_id.clone(), m.sender_id.clone()))
            .collect();

        for (message_id, sender_id) in unread {
            self.state
                .update_message_status(chat_id, &message_id, MessageStatus::Read);
            if let Some(relay) = self.relay.as_mut() {
                if relay.is_connected() {
                    let receipt = ReadReceipt {
                        chat_id: chat_id.to_string(),
                        message_id: message_id.clone(),
                        reader_id: reader_id.clone(),
                        sender_id,
                    };
                    if let Err(e) = relay.send_read_receipt(receipt) {
                        warn!(message_id, error = %e, "read receipt not sent");
                    }
                }
            }
        }
        self.persist();
        Ok(())
    }

    /// Opens the chat with a participant, creating it if needed. Idempotent;
    /// an existing chat is returned with refreshed participant details.
    pub fn create_or_get_chat(
        &mut self,
        participant_id: &str,
        participant_name: &str,
    ) -> AppResult<Chat> {
        validation::validate_display_name(participant_name)?;
        let chat = self
            .state
            .create_or_get_chat(participant_id, participant_name.trim(), None)?
            .clone();
        self.persist();
        Ok(chat)
    }

    pub fn chats(&self) -> &[Chat] {
        self.state.chats()
    }

    pub fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.state.chat_by_id(chat_id)
    }

    pub fn messages(&self, chat_id: &str) -> &[Message] {
        self.state.messages_for(chat_id)
    }

    // === Announcements ===

    /// Broadcasts an announcement: prepends it to the local list, pushes it
    /// over every open peer session, and hands it to the relay for network
    /// fan-out. Requires the broadcast credential in the configuration; the
    /// relay makes the final authorization call on its leg.
    ///
    /// Transport legs are best-effort, like message dispatch. The local copy
    /// stays regardless.
    pub fn broadcast_announcement(
        &mut self,
        title: &str,
        content: &str,
    ) -> AppResult<Announcement> {
        validation::validate_announcement(title, content)?;
        let token = self
            .config
            .broadcast_token
            .clone()
            .ok_or_else(|| AppError::Configuration("broadcast token not configured".into()))?;

        let announcement = Announcement::new(title.trim(), content.trim(), now_millis());
        self.state.push_announcement(announcement.clone());
        self.persist();

        if let Some(peers) = self.peers.as_mut() {
            for peer_id in peers.connected_peers() {
                let frame = PeerFrame::Announcement {
                    announcement: announcement.clone(),
                };
                if !peers.send_frame(&peer_id, &frame) {
                    warn!(peer_id = %peer_id, "announcement not sent over peer channel");
                }
            }
        }

        match self.relay.as_mut() {
            Some(relay) => {
                if let Err(e) = relay.send_broadcast(BroadcastAuth::new(&token), &announcement) {
                    warn!(error = %e, "announcement broadcast not relayed");
                }
            }
            None => warn!("broadcasting without a relay connection"),
        }
        Ok(announcement)
    }

    pub fn announcements(&self) -> &[Announcement] {
        self.state.announcements()
    }

    pub fn mark_announcement_read(&mut self, id: &str) -> AppResult<()> {
        self.state.mark_announcement_read(id);
        self.persist();
        Ok(())
    }

    pub fn delete_announcement(&mut self, id: &str) -> AppResult<()> {
        self.state.delete_announcement(id);
        self.persist();
        Ok(())
    }

    /// Records the newest announcement as seen, for the "new announcement"
    /// badge.
    pub fn mark_announcements_seen(&mut self) -> AppResult<()> {
        if let Some(newest) = self.state.announcements().first() {
            self.store.save_last_seen_announcement_id(&newest.id)?;
        }
        Ok(())
    }

    /// Whether announcements newer than the last seen one exist.
    pub fn has_new_announcements(&self) -> AppResult<bool> {
        let Some(newest) = self.state.announcements().first() else {
            return Ok(false);
        };
        let last_seen = self.store.load_last_seen_announcement_id()?;
        Ok(last_seen.as_deref() != Some(newest.id.as_str()))
    }

    // === Inbound processing ===

    /// Drains both transports, applies everything to local state, persists,
    /// and dispatches the resulting events. Returns the events.
    pub fn process_incoming(&mut self) -> AppResult<Vec<AppEvent>> {
        let mut out = Vec::new();
        let mut dirty = false;

        let relay_events = match self.relay.as_mut() {
            Some(relay) if relay.is_connected() => relay.poll()?,
            _ => Vec::new(),
        };
        for event in relay_events {
            match event {
                RelayEvent::Message(mut message) => {
                    // Arrival proves delivery of our copy
                    message.status = MessageStatus::Delivered;
                    dirty |= self.ingest_message(message, &mut out)?;
                }
                RelayEvent::StatusUpdate(update) => {
                    let changed = self.state.update_message_status(
                        &update.chat_id,
                        &update.message_id,
                        update.status,
                    );
                    if changed {
                        dirty = true;
                        out.push(AppEvent::MessageStatusChanged {
                            chat_id: update.chat_id,
                            message_id: update.message_id,
                            status: update.status,
                        });
                    }
                }
                RelayEvent::Announcement(announcement) => {
                    let id = announcement.id.clone();
                    if self.state.push_announcement(announcement) {
                        dirty = true;
                        out.push(AppEvent::AnnouncementReceived { announcement_id: id });
                    }
                }
                RelayEvent::Presence(presence) => {
                    if presence.online {
                        self.online_users.insert(presence.user_id.clone());
                    } else {
                        self.online_users.remove(&presence.user_id);
                    }
                    out.push(AppEvent::PresenceChanged {
                        user_id: presence.user_id,
                        online: presence.online,
                    });
                }
                RelayEvent::OnlineUsers(users) => {
                    self.online_users = users.into_iter().collect();
                }
            }
        }

        let peer_frames = self
            .peers
            .as_mut()
            .map(|p| p.poll())
            .unwrap_or_default();
        for (peer_id, frame) in peer_frames {
            match frame {
                PeerFrame::Message { mut message } => {
                    message.status = MessageStatus::Delivered;
                    dirty |= self.ingest_message(message, &mut out)?;
                }
                PeerFrame::Announcement { announcement } => {
                    let id = announcement.id.clone();
                    if self.state.push_announcement(announcement) {
                        dirty = true;
                        out.push(AppEvent::AnnouncementReceived { announcement_id: id });
                    }
                }
                PeerFrame::Identity { user_id, display_name } => {
                    if user_id == peer_id {
                        // Refresh the chat snapshot with the peer's current name
                        self.state.create_or_get_chat(&user_id, &display_name, None)?;
                        dirty = true;
                    } else {
                        warn!(peer_id, claimed = %user_id, "identity frame id mismatch");
                    }
                }
            }
        }

        // Not every mutation produces an event (an identity refresh is
        // silent), so persistence keys off mutations, not events
        if dirty {
            self.persist();
        }
        for event in &out {
            self.events.dispatch(event.clone());
        }
        Ok(out)
    }

    /// Applies one inbound message to state. Returns whether state changed.
    fn ingest_message(&mut self, message: Message, out: &mut Vec<AppEvent>) -> AppResult<bool> {
        let Some(profile) = self.state.profile() else {
            warn!("dropping inbound message before profile setup");
            return Ok(false);
        };
        if message.sender_id == profile.user_id {
            // Our own message echoed back
            return Ok(false);
        }

        let sender_name = self
            .state
            .paired_user(&message.sender_id)
            .map(|p| p.effective_name().to_string())
            .unwrap_or_else(|| message.sender_id.clone());
        self.state
            .create_or_get_chat(&message.sender_id, &sender_name, None)?;

        let chat_id = message.chat_id.clone();
        let message_id = message.message_id.clone();
        if self.state.add_message(message)? {
            out.push(AppEvent::MessageReceived { chat_id, message_id });
        }
        Ok(true)
    }

    // === Persistence ===

    /// Persists the full state now, regardless of the auto-save setting.
    pub fn save(&self) -> AppResult<()> {
        self.store.save_state(&self.state)?;
        Ok(())
    }

    /// Resolves divergence between the primary and backup databases and
    /// reloads state from the result.
    pub fn reconcile_storage(&mut self) -> AppResult<()> {
        let snapshot = self.store.reconcile()?;
        self.state = ChatState::from_parts(
            snapshot.profile,
            snapshot.paired_users,
            snapshot.chats,
            snapshot.messages,
            snapshot.announcements,
            snapshot.invites,
        );
        Ok(())
    }

    /// Wipes all local data: state, both databases, and peer sessions.
    pub fn clear_all_data(&mut self) -> AppResult<()> {
        if let Some(peers) = self.peers.as_mut() {
            peers.disconnect_all();
        }
        self.state.clear_all();
        self.peers = None;
        self.store.clear()?;
        Ok(())
    }

    /// Best-effort auto-save. A failed write is logged and the in-memory
    /// mutation kept; the explicit [`save`](Self::save) surfaces storage
    /// errors.
    fn persist(&self) {
        if !self.config.auto_save {
            return;
        }
        if let Err(e) = self.store.save_state(&self.state) {
            warn!(error = %e, "auto-save failed, keeping in-memory state");
        }
    }

    /// Direct access to the relay client, for tests driving a mock
    /// transport.
    pub fn relay_mut(&mut self) -> Option<&mut RelayClient<T>> {
        self.relay.as_mut()
    }
}
