// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Client
//!
//! High-level interface over a [`Transport`]: registration, outbound sends,
//! and an inbound event stream with exactly-once delivery per envelope id.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use super::error::NetworkError;
use super::message::{
    BroadcastAuth, BroadcastRequest, MessageEnvelope, MessageId, PresenceUpdate, PrivateMessage,
    ReadReceipt, Register, RelayPayload, StatusUpdate,
};
use super::protocol::create_envelope;
use super::transport::{ConnectionState, Transport, TransportConfig};
use crate::chat::{Announcement, Message};

/// Configuration for the relay client.
#[derive(Debug, Clone)]
pub struct RelayClientConfig {
    /// Transport configuration.
    pub transport: TransportConfig,
    /// How many envelope ids to remember for deduplication.
    pub dedup_window: usize,
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        RelayClientConfig {
            transport: TransportConfig::default(),
            dedup_window: 1024,
        }
    }
}

/// An inbound event surfaced by [`RelayClient::poll`].
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// A chat message addressed to this user.
    Message(Message),
    /// Delivery status change for a message this user sent.
    StatusUpdate(StatusUpdate),
    /// A broadcast announcement.
    Announcement(Announcement),
    /// One user's presence changed.
    Presence(PresenceUpdate),
    /// Full presence roster, sent once after registration.
    OnlineUsers(Vec<String>),
}

/// Relay client bound to one user id.
///
/// # Example
///
/// ```ignore
/// use peerlink_core::network::{MockTransport, RelayClient, RelayClientConfig};
///
/// let transport = MockTransport::new();
/// let mut client = RelayClient::new(transport, RelayClientConfig::default(), "my-id".into());
///
/// client.connect()?;
/// client.send_message(&message)?;
/// for event in client.poll()? { /* apply to state */ }
/// ```
pub struct RelayClient<T: Transport> {
    transport: T,
    config: RelayClientConfig,
    user_id: String,
    /// Envelope ids already surfaced, for exactly-once delivery.
    seen_ids: HashSet<MessageId>,
    /// Insertion order of `seen_ids`, for bounded eviction.
    seen_order: VecDeque<MessageId>,
}

impl<T: Transport> RelayClient<T> {
    /// Creates a new relay client.
    pub fn new(transport: T, config: RelayClientConfig, user_id: String) -> Self {
        RelayClient {
            transport,
            config,
            user_id,
            seen_ids: HashSet::new(),
            seen_order: VecDeque::new(),
        }
    }

    /// Connects to the relay and registers this user id, so the relay can
    /// route inbound messages to this connection.
    pub fn connect(&mut self) -> Result<(), NetworkError> {
        self.transport.connect(&self.config.transport)?;

        let envelope = create_envelope(RelayPayload::Register(Register {
            user_id: self.user_id.clone(),
        }));
        self.transport.send(&envelope)
    }

    /// Disconnects from the relay.
    pub fn disconnect(&mut self) -> Result<(), NetworkError> {
        self.transport.disconnect()
    }

    /// Returns true if connected.
    pub fn is_connected(&self) -> bool {
        self.transport.state() == ConnectionState::Connected
    }

    /// Sends a chat message through the relay. Returns the envelope id.
    pub fn send_message(&mut self, message: &Message) -> Result<MessageId, NetworkError> {
        let envelope = create_envelope(RelayPayload::PrivateMessage(PrivateMessage {
            message: message.clone(),
        }));
        let id = envelope.message_id.clone();
        self.transport.send(&envelope)?;
        debug!(envelope_id = %id, receiver = %message.receiver_id, "relayed message");
        Ok(id)
    }

    /// Sends a read receipt back to the original sender.
    pub fn send_read_receipt(&mut self, receipt: ReadReceipt) -> Result<(), NetworkError> {
        let envelope = create_envelope(RelayPayload::MessageRead(receipt));
        self.transport.send(&envelope)
    }

    /// Requests an announcement broadcast. The relay verifies the bearer
    /// token and rejects the request if it does not match.
    pub fn send_broadcast(
        &mut self,
        auth: BroadcastAuth,
        announcement: &Announcement,
    ) -> Result<(), NetworkError> {
        let envelope = create_envelope(RelayPayload::Broadcast(BroadcastRequest {
            auth,
            announcement: announcement.clone(),
        }));
        self.transport.send(&envelope)
    }

    /// Drains every available inbound envelope into events.
    ///
    /// Envelopes whose id was already surfaced are dropped, so redelivery
    /// after a reconnect cannot duplicate an event.
    pub fn poll(&mut self) -> Result<Vec<RelayEvent>, NetworkError> {
        let mut events = Vec::new();

        while let Some(envelope) = self.transport.receive()? {
            if !self.mark_seen(&envelope.message_id) {
                debug!(envelope_id = %envelope.message_id, "dropping duplicate envelope");
                continue;
            }
            if let Some(event) = Self::event_for(envelope) {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Direct access to the transport, for tests driving a mock.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn event_for(envelope: MessageEnvelope) -> Option<RelayEvent> {
        match envelope.payload {
            RelayPayload::NewMessage(message) => Some(RelayEvent::Message(message)),
            RelayPayload::StatusUpdate(update) => Some(RelayEvent::StatusUpdate(update)),
            RelayPayload::NewAnnouncement(announcement) => {
                Some(RelayEvent::Announcement(announcement))
            }
            RelayPayload::Presence(presence) => Some(RelayEvent::Presence(presence)),
            RelayPayload::OnlineUsers(users) => Some(RelayEvent::OnlineUsers(users)),
            other => {
                warn!(?other, "ignoring client-bound envelope with outbound payload");
                None
            }
        }
    }

    /// Records an envelope id. Returns false if it was already seen.
    fn mark_seen(&mut self, id: &str) -> bool {
        if self.seen_ids.contains(id) {
            return false;
        }
        if self.seen_order.len() >= self.config.dedup_window {
            if let Some(evicted) = self.seen_order.pop_front() {
                self.seen_ids.remove(&evicted);
            }
        }
        self.seen_ids.insert(id.to_string());
        self.seen_order.push_back(id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mock::MockTransport;

    fn connected_client() -> RelayClient<MockTransport> {
        let mut client = RelayClient::new(
            MockTransport::new(),
            RelayClientConfig::default(),
            "a1".into(),
        );
        client.connect().unwrap();
        client
    }

    #[test]
    fn test_connect_registers_user_id() {
        let mut client = connected_client();

        let sent = client.transport_mut().sent_messages();
        assert_eq!(sent.len(), 1);
        match &sent[0].payload {
            RelayPayload::Register(r) => assert_eq!(r.user_id, "a1"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_poll_surfaces_inbound_message() {
        let mut client = connected_client();
        let msg = Message::outgoing("a1_b2", "b2", "a1", "hi", 1_000);
        let envelope = create_envelope(RelayPayload::NewMessage(msg));
        client.transport_mut().queue_receive(envelope);

        let events = client.poll().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RelayEvent::Message(m) if m.text == "hi"));
    }

    #[test]
    fn test_poll_drops_duplicate_envelopes() {
        let mut client = connected_client();
        let msg = Message::outgoing("a1_b2", "b2", "a1", "hi", 1_000);
        let envelope = create_envelope(RelayPayload::NewMessage(msg));

        client.transport_mut().queue_receive(envelope.clone());
        client.transport_mut().queue_receive(envelope);

        let events = client.poll().unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_dedup_survives_across_polls() {
        let mut client = connected_client();
        let msg = Message::outgoing("a1_b2", "b2", "a1", "hi", 1_000);
        let envelope = create_envelope(RelayPayload::NewMessage(msg));

        client.transport_mut().queue_receive(envelope.clone());
        assert_eq!(client.poll().unwrap().len(), 1);

        // Relay redelivers the same envelope after a hiccup
        client.transport_mut().queue_receive(envelope);
        assert!(client.poll().unwrap().is_empty());
    }

    #[test]
    fn test_send_message_wraps_private_message() {
        let mut client = connected_client();
        client.transport_mut().clear_sent();

        let msg = Message::outgoing("a1_b2", "a1", "b2", "hello", 1_000);
        client.send_message(&msg).unwrap();

        let sent = client.transport_mut().sent_messages();
        match &sent[0].payload {
            RelayPayload::PrivateMessage(pm) => {
                assert_eq!(pm.message.receiver_id, "b2");
                assert_eq!(pm.message.text, "hello");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_send_fails_when_disconnected() {
        let mut client = RelayClient::new(
            MockTransport::new(),
            RelayClientConfig::default(),
            "a1".into(),
        );

        let msg = Message::outgoing("a1_b2", "a1", "b2", "hello", 1_000);
        assert!(matches!(
            client.send_message(&msg),
            Err(NetworkError::NotConnected)
        ));
    }
}
