// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer Channel
//!
//! Abstraction over one open point-to-point link, plus an in-process
//! implementation used for tests and same-host peers. Real endpoints plug in
//! their own implementation; the transport layer only needs frame-in,
//! frame-out, and a liveness flag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::error::PeerError;
use super::payload::PeerFrame;

/// One endpoint of a bidirectional frame link.
pub trait PeerChannel: Send {
    /// Sends a frame to the remote endpoint.
    fn send(&mut self, frame: &PeerFrame) -> Result<(), PeerError>;

    /// Receives the next frame from the remote endpoint, if one is waiting.
    fn receive(&mut self) -> Option<PeerFrame>;

    /// Whether the link is still open. Closing either side closes both.
    fn is_open(&self) -> bool;

    /// Closes the link.
    fn close(&mut self);
}

/// In-process channel endpoint. Created in connected pairs.
pub struct InProcessChannel {
    /// Frames waiting for this endpoint.
    inbox: Arc<Mutex<VecDeque<PeerFrame>>>,
    /// Inbox of the remote endpoint.
    outbox: Arc<Mutex<VecDeque<PeerFrame>>>,
    open: Arc<AtomicBool>,
}

impl InProcessChannel {
    /// Creates two connected endpoints.
    pub fn pair() -> (InProcessChannel, InProcessChannel) {
        let a_inbox = Arc::new(Mutex::new(VecDeque::new()));
        let b_inbox = Arc::new(Mutex::new(VecDeque::new()));
        let open = Arc::new(AtomicBool::new(true));

        let a = InProcessChannel {
            inbox: a_inbox.clone(),
            outbox: b_inbox.clone(),
            open: open.clone(),
        };
        let b = InProcessChannel {
            inbox: b_inbox,
            outbox: a_inbox,
            open,
        };
        (a, b)
    }
}

impl PeerChannel for InProcessChannel {
    fn send(&mut self, frame: &PeerFrame) -> Result<(), PeerError> {
        if !self.is_open() {
            return Err(PeerError::ChannelClosed);
        }
        self.outbox
            .lock()
            .expect("peer channel lock poisoned")
            .push_back(frame.clone());
        Ok(())
    }

    fn receive(&mut self) -> Option<PeerFrame> {
        self.inbox
            .lock()
            .expect("peer channel lock poisoned")
            .pop_front()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_frame(user_id: &str) -> PeerFrame {
        PeerFrame::Identity {
            user_id: user_id.into(),
            display_name: "Someone".into(),
        }
    }

    #[test]
    fn test_frames_cross_the_pair() {
        let (mut a, mut b) = InProcessChannel::pair();

        a.send(&identity_frame("a1")).unwrap();
        b.send(&identity_frame("b2")).unwrap();

        assert!(matches!(
            b.receive(),
            Some(PeerFrame::Identity { user_id, .. }) if user_id == "a1"
        ));
        assert!(matches!(
            a.receive(),
            Some(PeerFrame::Identity { user_id, .. }) if user_id == "b2"
        ));
        assert!(a.receive().is_none());
    }

    #[test]
    fn test_closing_either_side_closes_both() {
        let (mut a, b) = InProcessChannel::pair();
        assert!(a.is_open() && b.is_open());

        a.close();
        assert!(!b.is_open());
        assert!(matches!(
            a.send(&identity_frame("a1")),
            Err(PeerError::ChannelClosed)
        ));
    }

    #[test]
    fn test_receive_drains_after_close() {
        let (mut a, mut b) = InProcessChannel::pair();
        a.send(&identity_frame("a1")).unwrap();
        a.close();

        // Already-queued frames are still readable
        assert!(b.receive().is_some());
        assert!(b.receive().is_none());
    }
}
