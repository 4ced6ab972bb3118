// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Callbacks for PeerLink events.

use std::sync::Arc;

use crate::chat::MessageStatus;
use crate::network::ConnectionState;

/// Events emitted by PeerLink.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A chat message arrived, over either transport.
    MessageReceived {
        chat_id: String,
        message_id: String,
    },

    /// Delivery status of an outbound message changed.
    MessageStatusChanged {
        chat_id: String,
        message_id: String,
        status: MessageStatus,
    },

    /// An outbound message could not be delivered on any path.
    MessageFailed {
        chat_id: String,
        message_id: String,
        error: String,
    },

    /// A new user was paired.
    PairedUserAdded { user_id: String },

    /// A broadcast announcement arrived.
    AnnouncementReceived { announcement_id: String },

    /// A direct peer session opened.
    PeerConnected { user_id: String },

    /// A direct peer session closed or timed out.
    PeerDisconnected { user_id: String },

    /// One user's relay presence changed.
    PresenceChanged { user_id: String, online: bool },

    /// Relay connection state changed.
    ConnectionStateChanged { state: ConnectionState },

    /// Error from background processing.
    Error { message: String },
}

/// Event handler trait.
///
/// Implement this trait to receive PeerLink events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: AppEvent);
}

/// Simple callback-based event handler.
///
/// Wraps a closure for easy event handling.
pub struct CallbackHandler<F>
where
    F: Fn(AppEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(AppEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(AppEvent) + Send + Sync,
{
    fn on_event(&self, event: AppEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Removes all handlers.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: AppEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
