// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! Mock implementation of the Transport trait for testing.

use std::collections::VecDeque;

use super::error::NetworkError;
use super::message::{MessageEnvelope, RelayPayload, StatusUpdate};
use super::protocol::create_envelope;
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};
use crate::chat::MessageStatus;

/// Mock transport for testing.
///
/// Allows injection of responses and tracking of sent messages.
///
/// # Example
///
/// ```ignore
/// use peerlink_core::network::{MockTransport, TransportConfig, Transport};
///
/// let mut transport = MockTransport::new();
/// transport.connect(&TransportConfig::default()).unwrap();
///
/// // Queue an envelope to be returned by receive()
/// transport.queue_receive(some_envelope);
///
/// // Send an envelope
/// transport.send(&outgoing).unwrap();
///
/// // Check what was sent
/// assert_eq!(transport.sent_messages().len(), 1);
/// ```
#[derive(Debug)]
pub struct MockTransport {
    state: ConnectionState,
    /// Envelopes that have been sent.
    sent_messages: Vec<MessageEnvelope>,
    /// Envelopes to return on receive().
    receive_queue: VecDeque<MessageEnvelope>,
    /// Error to inject on next operation.
    inject_error: Option<NetworkError>,
    /// Whether to answer sent chat messages with a delivered receipt.
    auto_deliver: bool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        MockTransport {
            state: ConnectionState::Disconnected,
            sent_messages: Vec::new(),
            receive_queue: VecDeque::new(),
            inject_error: None,
            auto_deliver: false,
        }
    }

    /// Queues an envelope to be returned by the next receive() call.
    pub fn queue_receive(&mut self, message: MessageEnvelope) {
        self.receive_queue.push_back(message);
    }

    /// Returns all envelopes that have been sent.
    pub fn sent_messages(&self) -> &[MessageEnvelope] {
        &self.sent_messages
    }

    /// Clears the sent messages buffer.
    pub fn clear_sent(&mut self) {
        self.sent_messages.clear();
    }

    /// Injects an error to be returned on the next operation.
    pub fn inject_error(&mut self, error: NetworkError) {
        self.inject_error = Some(error);
    }

    /// When enabled, every sent chat message is answered with a
    /// `StatusUpdate(Delivered)` receipt, simulating an online receiver.
    pub fn set_auto_deliver(&mut self, enabled: bool) {
        self.auto_deliver = enabled;
    }

    /// Manually sets the connection state (for testing state transitions).
    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Returns the number of envelopes in the receive queue.
    pub fn receive_queue_len(&self) -> usize {
        self.receive_queue.len()
    }

    fn check_error(&mut self) -> TransportResult<()> {
        if let Some(err) = self.inject_error.take() {
            return Err(err);
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _config: &TransportConfig) -> TransportResult<()> {
        self.check_error()?;
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        self.check_error()?;
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state.clone()
    }

    fn send(&mut self, message: &MessageEnvelope) -> TransportResult<()> {
        self.check_error()?;

        if self.state != ConnectionState::Connected {
            return Err(NetworkError::NotConnected);
        }

        self.sent_messages.push(message.clone());

        if self.auto_deliver {
            if let RelayPayload::PrivateMessage(pm) = &message.payload {
                let receipt = create_envelope(RelayPayload::StatusUpdate(StatusUpdate {
                    chat_id: pm.message.chat_id.clone(),
                    message_id: pm.message.message_id.clone(),
                    status: MessageStatus::Delivered,
                }));
                self.receive_queue.push_back(receipt);
            }
        }

        Ok(())
    }

    fn receive(&mut self) -> TransportResult<Option<MessageEnvelope>> {
        self.check_error()?;

        if self.state != ConnectionState::Connected {
            return Err(NetworkError::NotConnected);
        }

        Ok(self.receive_queue.pop_front())
    }

    fn has_pending(&self) -> bool {
        !self.receive_queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use crate::network::message::PrivateMessage;

    fn chat_envelope() -> MessageEnvelope {
        let msg = Message::outgoing("a1_b2", "a1", "b2", "hi", 1_000);
        create_envelope(RelayPayload::PrivateMessage(PrivateMessage { message: msg }))
    }

    #[test]
    fn test_send_requires_connection() {
        let mut transport = MockTransport::new();
        let result = transport.send(&chat_envelope());
        assert!(matches!(result, Err(NetworkError::NotConnected)));
    }

    #[test]
    fn test_send_records_messages() {
        let mut transport = MockTransport::new();
        transport.connect(&TransportConfig::default()).unwrap();

        transport.send(&chat_envelope()).unwrap();
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[test]
    fn test_receive_returns_queued_in_order() {
        let mut transport = MockTransport::new();
        transport.connect(&TransportConfig::default()).unwrap();

        let first = chat_envelope();
        let second = chat_envelope();
        transport.queue_receive(first.clone());
        transport.queue_receive(second.clone());

        assert!(transport.has_pending());
        assert_eq!(
            transport.receive().unwrap().unwrap().message_id,
            first.message_id
        );
        assert_eq!(
            transport.receive().unwrap().unwrap().message_id,
            second.message_id
        );
        assert!(transport.receive().unwrap().is_none());
    }

    #[test]
    fn test_auto_deliver_generates_receipt() {
        let mut transport = MockTransport::new();
        transport.connect(&TransportConfig::default()).unwrap();
        transport.set_auto_deliver(true);

        let envelope = chat_envelope();
        transport.send(&envelope).unwrap();

        let receipt = transport.receive().unwrap().unwrap();
        match receipt.payload {
            RelayPayload::StatusUpdate(update) => {
                assert_eq!(update.status, MessageStatus::Delivered);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_injected_error_surfaces_once() {
        let mut transport = MockTransport::new();
        transport.inject_error(NetworkError::Timeout);

        assert!(transport.connect(&TransportConfig::default()).is_err());
        assert!(transport.connect(&TransportConfig::default()).is_ok());
    }
}
