// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Fixtures
//!
//! Prebuilt app instances in common configurations.

use peerlink_core::{InProcessChannel, MockTransport, PeerLink};

/// A fresh in-memory app without a profile.
pub fn new_app() -> PeerLink<MockTransport> {
    PeerLink::in_memory(MockTransport::new()).unwrap()
}

/// A fresh in-memory app with a profile.
pub fn app_with_profile(display_name: &str) -> PeerLink<MockTransport> {
    let mut app = new_app();
    app.create_profile(display_name, "0791234567").unwrap();
    app
}

/// Two apps paired with each other via invite links.
///
/// Returns `(alice, bob, alice_id, bob_id)`.
pub fn paired_apps() -> (PeerLink<MockTransport>, PeerLink<MockTransport>, String, String) {
    let mut alice = app_with_profile("Alice");
    let mut bob = app_with_profile("Bobby");

    let alice_id = alice.profile().unwrap().user_id.clone();
    let bob_id = bob.profile().unwrap().user_id.clone();
    let alice_link = alice.invite_link().unwrap();
    let bob_link = bob.invite_link().unwrap();

    bob.accept_invite(&alice_link, "Alice").unwrap();
    alice.accept_invite(&bob_link, "Bobby").unwrap();

    (alice, bob, alice_id, bob_id)
}

/// Runs the full peer handshake between two paired apps over an in-process
/// channel pair.
pub fn open_peer_session(
    alice: &mut PeerLink<MockTransport>,
    bob: &mut PeerLink<MockTransport>,
    bob_id: &str,
) {
    let offer = alice.connect_peer(bob_id).unwrap();
    let (ch_a, ch_b) = InProcessChannel::pair();
    let answer = bob.accept_peer_offer(&offer, Box::new(ch_b)).unwrap();
    alice
        .complete_peer_connection(&answer, Box::new(ch_a))
        .unwrap();
}
