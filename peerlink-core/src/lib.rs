// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! PeerLink Core Library
//!
//! Local-first core of a peer-pairing chat application: profile and pairing
//! management, the chat state machine, dual-transport message dispatch
//! (direct peer first, relay fallback), and persistence with backup
//! recovery. Platform frontends drive everything through the [`api`] layer.

pub mod api;
pub mod chat;
pub mod identity;
pub mod network;
pub mod peer;
pub mod roster;
pub mod storage;

pub use api::{
    AppConfig, AppError, AppEvent, AppResult, CallbackHandler, EventDispatcher, EventHandler,
    PeerLink, ValidationError,
};
pub use chat::{
    chat_id_for, Announcement, Chat, ChatError, ChatState, Message, MessageFile, MessageStatus,
    PairOutcome, ParticipantDetails, EDIT_WINDOW_MS,
};
pub use identity::{InviteLink, UserProfile, DEFAULT_AVATAR, INVITE_LINK_PREFIX};
pub use network::{
    ConnectionState, MessageEnvelope, MockTransport, NetworkError, RelayClient, RelayClientConfig,
    RelayEvent, RelayPayload, Transport, TransportConfig,
};
#[cfg(feature = "network")]
pub use network::WebSocketTransport;
pub use peer::{InProcessChannel, PeerChannel, PeerError, PeerFrame, PeerTransport};
pub use roster::{Invite, PairedUser, Party};
pub use storage::{StateSnapshot, StorageError, Store};
