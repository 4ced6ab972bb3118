// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer Transport
//!
//! Per-peer session table driving the offer/answer handshake and frame
//! exchange over [`PeerChannel`]s. The initiating side creates an offer blob,
//! the accepting side turns it into an answer blob, and applying the answer
//! opens the session. Blobs travel out of band (pasted, or forwarded through
//! the relay); the transport never carries them itself.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use super::channel::PeerChannel;
use super::error::PeerError;
use super::payload::{decode_blob, encode_blob, Answer, NegotiationBlob, Offer, PeerFrame};

/// How long a pending offer waits for its answer before it is abandoned.
pub const NEGOTIATION_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Offer created, waiting for the answer.
    Negotiating,
    /// Handshake complete, frames may flow.
    Open,
    /// Closed locally or by the remote side.
    Closed,
}

struct PeerSession {
    state: SessionState,
    session_id: String,
    channel: Option<Box<dyn PeerChannel>>,
    /// Milliseconds since the Unix epoch when negotiation started.
    started_at: u64,
}

/// Direct peer connections of one installation, keyed by peer user id.
pub struct PeerTransport {
    local_id: String,
    sessions: HashMap<String, PeerSession>,
    negotiation_timeout_ms: u64,
}

impl PeerTransport {
    pub fn new(local_id: &str) -> Self {
        Self::with_timeout(local_id, NEGOTIATION_TIMEOUT_MS)
    }

    /// Like [`new`](Self::new), with an explicit negotiation timeout.
    pub fn with_timeout(local_id: &str, negotiation_timeout_ms: u64) -> Self {
        PeerTransport {
            local_id: local_id.to_string(),
            sessions: HashMap::new(),
            negotiation_timeout_ms,
        }
    }

    /// Starts a connection to `peer_id` and returns the offer blob to hand
    /// to the other side. A previous session with this peer is replaced.
    pub fn create_offer(&mut self, peer_id: &str, now: u64) -> Result<String, PeerError> {
        let session_id = Uuid::new_v4().to_string();
        let blob = encode_blob(&NegotiationBlob::Offer(Offer {
            session_id: session_id.clone(),
            from_id: self.local_id.clone(),
            description: Uuid::new_v4().to_string(),
            ice_candidates: Vec::new(),
        }))?;

        self.sessions.insert(
            peer_id.to_string(),
            PeerSession {
                state: SessionState::Negotiating,
                session_id,
                channel: None,
                started_at: now,
            },
        );
        debug!(peer_id, "created peer offer");
        Ok(blob)
    }

    /// Accepts an offer blob from a remote peer, binding `channel` to the
    /// session. Returns the answer blob to hand back, and the peer's id.
    pub fn accept_offer(
        &mut self,
        blob: &str,
        channel: Box<dyn PeerChannel>,
        now: u64,
    ) -> Result<(String, String), PeerError> {
        let offer = match decode_blob::<NegotiationBlob>(blob)? {
            NegotiationBlob::Offer(offer) => offer,
            NegotiationBlob::Answer(_) => {
                return Err(PeerError::InvalidPayload("expected an offer blob".into()))
            }
        };
        let answer_blob = encode_blob(&NegotiationBlob::Answer(Answer {
            session_id: offer.session_id.clone(),
            from_id: self.local_id.clone(),
            description: Uuid::new_v4().to_string(),
            ice_candidates: Vec::new(),
        }))?;

        self.sessions.insert(
            offer.from_id.clone(),
            PeerSession {
                state: SessionState::Open,
                session_id: offer.session_id,
                channel: Some(channel),
                started_at: now,
            },
        );
        debug!(peer_id = %offer.from_id, "accepted peer offer");
        Ok((answer_blob, offer.from_id))
    }

    /// Completes the handshake on the initiating side: binds `channel` to
    /// the session the answer belongs to and opens it. Returns the peer's
    /// id.
    pub fn apply_answer(
        &mut self,
        blob: &str,
        channel: Box<dyn PeerChannel>,
    ) -> Result<String, PeerError> {
        let answer = match decode_blob::<NegotiationBlob>(blob)? {
            NegotiationBlob::Answer(answer) => answer,
            NegotiationBlob::Offer(_) => {
                return Err(PeerError::InvalidPayload("expected an answer blob".into()))
            }
        };

        let session = self
            .sessions
            .get_mut(&answer.from_id)
            .filter(|s| s.state == SessionState::Negotiating && s.session_id == answer.session_id)
            .ok_or_else(|| PeerError::UnknownSession(answer.session_id.clone()))?;

        session.channel = Some(channel);
        session.state = SessionState::Open;
        debug!(peer_id = %answer.from_id, "peer session open");
        Ok(answer.from_id)
    }

    /// Sends a frame directly to `peer_id`. Returns false when no open
    /// session exists or the channel turned out to be dead; the caller is
    /// expected to fall back to the relay.
    pub fn send_frame(&mut self, peer_id: &str, frame: &PeerFrame) -> bool {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return false;
        };
        if session.state != SessionState::Open {
            return false;
        }
        let Some(channel) = session.channel.as_mut() else {
            return false;
        };

        match channel.send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(peer_id, error = %e, "peer send failed, closing session");
                session.state = SessionState::Closed;
                session.channel = None;
                false
            }
        }
    }

    /// Drains every open channel. Sessions whose channel has closed with
    /// nothing left to read are marked closed.
    pub fn poll(&mut self) -> Vec<(String, PeerFrame)> {
        let mut frames = Vec::new();

        for (peer_id, session) in self.sessions.iter_mut() {
            if session.state != SessionState::Open {
                continue;
            }
            let Some(channel) = session.channel.as_mut() else {
                continue;
            };

            let mut drained_any = false;
            while let Some(frame) = channel.receive() {
                frames.push((peer_id.clone(), frame));
                drained_any = true;
            }

            if !channel.is_open() && !drained_any {
                debug!(peer_id, "peer channel closed by remote");
                session.state = SessionState::Closed;
                session.channel = None;
            }
        }

        frames
    }

    /// Abandons negotiations older than the configured timeout. Returns the
    /// peer ids that timed out.
    pub fn check_timeouts(&mut self, now: u64) -> Vec<String> {
        let mut timed_out = Vec::new();

        for (peer_id, session) in self.sessions.iter_mut() {
            if session.state == SessionState::Negotiating
                && now.saturating_sub(session.started_at) >= self.negotiation_timeout_ms
            {
                session.state = SessionState::Closed;
                session.channel = None;
                timed_out.push(peer_id.clone());
            }
        }

        if !timed_out.is_empty() {
            warn!(?timed_out, "peer negotiations timed out");
        }
        timed_out
    }

    /// Whether an open session with `peer_id` exists.
    pub fn is_connected_to(&self, peer_id: &str) -> bool {
        self.sessions
            .get(peer_id)
            .is_some_and(|s| s.state == SessionState::Open)
    }

    /// Ids of all peers with an open session.
    pub fn connected_peers(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.state == SessionState::Open)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Closes the session with `peer_id`, if any.
    pub fn disconnect(&mut self, peer_id: &str) {
        if let Some(session) = self.sessions.get_mut(peer_id) {
            if let Some(channel) = session.channel.as_mut() {
                channel.close();
            }
            session.state = SessionState::Closed;
            session.channel = None;
        }
    }

    /// Closes every session.
    pub fn disconnect_all(&mut self) {
        let peers: Vec<String> = self.sessions.keys().cloned().collect();
        for peer_id in peers {
            self.disconnect(&peer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::channel::InProcessChannel;

    fn message_frame(text: &str) -> PeerFrame {
        PeerFrame::Message {
            message: crate::chat::Message::outgoing("a1_b2", "a1", "b2", text, 1_000),
        }
    }

    /// Runs the full handshake between two transports over an in-process
    /// channel pair.
    fn connected_pair() -> (PeerTransport, PeerTransport) {
        let mut alice = PeerTransport::new("a1");
        let mut bob = PeerTransport::new("b2");

        let offer = alice.create_offer("b2", 0).unwrap();

        let (ch_a, ch_b) = InProcessChannel::pair();
        let (answer, peer_id) = bob.accept_offer(&offer, Box::new(ch_b), 0).unwrap();
        assert_eq!(peer_id, "a1");

        let peer_id = alice.apply_answer(&answer, Box::new(ch_a)).unwrap();
        assert_eq!(peer_id, "b2");

        (alice, bob)
    }

    #[test]
    fn test_handshake_opens_both_sides() {
        let (alice, bob) = connected_pair();

        assert!(alice.is_connected_to("b2"));
        assert!(bob.is_connected_to("a1"));
        assert_eq!(alice.connected_peers(), vec!["b2".to_string()]);
    }

    #[test]
    fn test_frames_flow_both_ways() {
        let (mut alice, mut bob) = connected_pair();

        assert!(alice.send_frame("b2", &message_frame("hi")));

        let received = bob.poll();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "a1");
        assert!(matches!(
            &received[0].1,
            PeerFrame::Message { message } if message.text == "hi"
        ));

        assert!(bob.send_frame("a1", &message_frame("hey")));
        assert_eq!(alice.poll().len(), 1);
    }

    #[test]
    fn test_send_without_session_fails_soft() {
        let mut alice = PeerTransport::new("a1");
        assert!(!alice.send_frame("b2", &message_frame("hi")));
    }

    #[test]
    fn test_send_during_negotiation_fails_soft() {
        let mut alice = PeerTransport::new("a1");
        alice.create_offer("b2", 0).unwrap();
        assert!(!alice.send_frame("b2", &message_frame("hi")));
    }

    #[test]
    fn test_blob_kinds_are_not_interchangeable() {
        let mut alice = PeerTransport::new("a1");
        let mut bob = PeerTransport::new("b2");

        let offer = alice.create_offer("b2", 0).unwrap();
        let (ch_a, ch_b) = InProcessChannel::pair();
        let (answer, _) = bob.accept_offer(&offer, Box::new(ch_b), 0).unwrap();

        // An answer blob must not open a session as if it were an offer
        let mut carol = PeerTransport::new("c3");
        let (ch_c, _ch_d) = InProcessChannel::pair();
        assert!(matches!(
            carol.accept_offer(&answer, Box::new(ch_c), 0),
            Err(PeerError::InvalidPayload(_))
        ));

        // And an offer blob is rejected where an answer is expected
        assert!(matches!(
            alice.apply_answer(&offer, Box::new(ch_a)),
            Err(PeerError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_answer_must_match_pending_offer() {
        let mut alice = PeerTransport::new("a1");
        let mut bob = PeerTransport::new("b2");

        // Bob answers an offer Alice never made
        let offer = bob.create_offer("a1", 0).unwrap();
        let (ch_a, ch_b) = InProcessChannel::pair();
        let (answer, _) = alice.accept_offer(&offer, Box::new(ch_a), 0).unwrap();

        let mut carol = PeerTransport::new("c3");
        assert!(matches!(
            carol.apply_answer(&answer, Box::new(ch_b)),
            Err(PeerError::UnknownSession(_))
        ));
    }

    #[test]
    fn test_negotiation_times_out() {
        let mut alice = PeerTransport::new("a1");
        alice.create_offer("b2", 1_000).unwrap();

        assert!(alice.check_timeouts(1_000 + NEGOTIATION_TIMEOUT_MS - 1).is_empty());
        let timed_out = alice.check_timeouts(1_000 + NEGOTIATION_TIMEOUT_MS);
        assert_eq!(timed_out, vec!["b2".to_string()]);
        assert!(!alice.is_connected_to("b2"));
    }

    #[test]
    fn test_remote_close_detected_on_poll() {
        let (mut alice, mut bob) = connected_pair();

        bob.disconnect("a1");
        // First poll drains nothing and observes the closed channel
        assert!(alice.poll().is_empty());
        assert!(!alice.is_connected_to("b2"));
    }

    #[test]
    fn test_disconnect_all() {
        let (mut alice, _bob) = connected_pair();
        alice.disconnect_all();
        assert!(alice.connected_peers().is_empty());
    }
}
