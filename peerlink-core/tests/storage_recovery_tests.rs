// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistence and backup-recovery tests against real database files.

use peerlink_core::network::create_envelope;
use peerlink_core::storage::{reconcile, StateSnapshot};
use peerlink_core::{
    AppConfig, InProcessChannel, Message, MockTransport, PairedUser, PeerLink, RelayPayload,
    Store, UserProfile,
};

mod common;
use common::fixtures::app_with_profile;

#[test]
fn test_backup_heals_a_lost_primary() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("state.db");
    let backup = dir.path().join("state.db.bak");

    {
        let store = Store::open(&primary, &backup).unwrap();
        store
            .save_profile(&UserProfile::create("Alice", "0791234567"))
            .unwrap();
        store
            .save_paired_users(&[PairedUser::new("b2", "Bob")])
            .unwrap();
    }

    std::fs::remove_file(&primary).unwrap();

    let store = Store::open(&primary, &backup).unwrap();
    let profile = store.load_profile().unwrap().unwrap();
    assert_eq!(profile.display_name, "Alice");
    assert_eq!(store.load_paired_users().unwrap().len(), 1);
}

#[test]
fn test_primary_heals_a_lost_backup() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("state.db");
    let backup = dir.path().join("state.db.bak");

    {
        let store = Store::open(&primary, &backup).unwrap();
        store
            .save_profile(&UserProfile::create("Alice", "0791234567"))
            .unwrap();
    }

    std::fs::remove_file(&backup).unwrap();
    {
        let _store = Store::open(&primary, &backup).unwrap();
    }

    // The rebuilt backup alone is enough to restore state
    std::fs::remove_file(&primary).unwrap();
    let store = Store::open(&primary, &backup).unwrap();
    assert!(store.load_profile().unwrap().is_some());
}

#[test]
fn test_app_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::with_storage_path(dir.path().join("state.db"));

    let link = {
        let other = app_with_profile("Bobby");
        other.invite_link().unwrap()
    };

    let chat_id = {
        let mut app = PeerLink::with_transport(MockTransport::new(), config.clone()).unwrap();
        app.create_profile("Alice", "0791234567").unwrap();
        app.accept_invite(&link, "Bobby").unwrap();

        let bob_id = app.paired_users()[0].user_id.clone();
        let message = app.send_message(&bob_id, "hello").unwrap();
        message.chat_id
    };

    let app = PeerLink::<MockTransport>::new(config).unwrap();
    assert_eq!(app.profile().unwrap().display_name, "Alice");
    assert_eq!(app.paired_users().len(), 1);
    assert_eq!(app.messages(&chat_id).len(), 1);
    assert_eq!(app.messages(&chat_id)[0].text, "hello");

    // The backup replica was written alongside the primary
    assert!(dir.path().join("state.db.bak").exists());
}

#[test]
fn test_app_recovers_from_backup_after_primary_loss() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("state.db");
    let config = AppConfig::with_storage_path(primary.clone());

    {
        let mut app = PeerLink::with_transport(MockTransport::new(), config.clone()).unwrap();
        app.create_profile("Alice", "0791234567").unwrap();
    }

    std::fs::remove_file(&primary).unwrap();

    let app = PeerLink::<MockTransport>::new(config).unwrap();
    assert_eq!(app.profile().unwrap().display_name, "Alice");
}

#[test]
fn test_failed_auto_save_keeps_in_memory_state() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("store");
    let config = AppConfig::with_storage_path(sub.join("state.db"));

    let link = {
        let other = app_with_profile("Bobby");
        other.invite_link().unwrap()
    };

    let mut app = PeerLink::with_transport(MockTransport::new(), config).unwrap();
    app.create_profile("Alice", "0791234567").unwrap();
    app.accept_invite(&link, "Bobby").unwrap();
    let bob_id = app.paired_users()[0].user_id.clone();

    // Pull the directory out from under the databases; the next write
    // cannot journal and fails
    std::fs::remove_dir_all(&sub).unwrap();

    let message = app.send_message(&bob_id, "hello").unwrap();
    assert_eq!(app.messages(&message.chat_id).len(), 1);
    assert_eq!(app.messages(&message.chat_id)[0].text, "hello");
}

#[test]
fn test_identity_driven_chat_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::with_storage_path(dir.path().join("state.db"));

    {
        let mut alice = PeerLink::with_transport(MockTransport::new(), config.clone()).unwrap();
        alice.create_profile("Alice", "0791234567").unwrap();
        let alice_id = alice.profile().unwrap().user_id.clone();

        // Carol initiates; Alice only ever sees her identity frame
        let mut carol = app_with_profile("Carol");
        carol
            .accept_invite(&alice.invite_link().unwrap(), "Alice")
            .unwrap();
        let offer = carol.connect_peer(&alice_id).unwrap();
        let (ch_c, ch_a) = InProcessChannel::pair();
        let answer = alice.accept_peer_offer(&offer, Box::new(ch_a)).unwrap();
        carol
            .complete_peer_connection(&answer, Box::new(ch_c))
            .unwrap();

        // The identity frame creates the chat silently
        let events = alice.process_incoming().unwrap();
        assert!(events.is_empty());
        assert_eq!(alice.chats().len(), 1);
    }

    let alice = PeerLink::<MockTransport>::new(config).unwrap();
    assert_eq!(alice.chats().len(), 1);
}

#[test]
fn test_reconcile_prefers_the_richer_side_per_key() {
    // Primary restored from an old copy: fewer messages, but it picked up an
    // announcement the backup never saw.
    let mut primary = StateSnapshot::default();
    primary.messages.insert(
        "a1_b2".into(),
        vec![Message::outgoing("a1_b2", "a1", "b2", "one", 1)],
    );
    primary.announcements = vec![peerlink_core::Announcement::new("News", "c", 5)];

    let mut backup = StateSnapshot::default();
    backup.messages.insert(
        "a1_b2".into(),
        vec![
            Message::outgoing("a1_b2", "a1", "b2", "one", 1),
            Message::outgoing("a1_b2", "b2", "a1", "two", 2),
        ],
    );

    let resolved = reconcile(primary, backup);
    assert_eq!(resolved.messages["a1_b2"].len(), 2);
    assert_eq!(resolved.announcements.len(), 1);
}

#[test]
fn test_announcement_badge_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::with_storage_path(dir.path().join("state.db"));

    {
        let mut app = PeerLink::with_transport(MockTransport::new(), config.clone()).unwrap();
        app.create_profile("Alice", "0791234567").unwrap();
        app.connect().unwrap();

        let announcement = peerlink_core::Announcement::new("News", "content", 1_000);
        let envelope = create_envelope(RelayPayload::NewAnnouncement(announcement));
        app.relay_mut().unwrap().transport_mut().queue_receive(envelope);
        app.process_incoming().unwrap();

        assert!(app.has_new_announcements().unwrap());
        app.mark_announcements_seen().unwrap();
        assert!(!app.has_new_announcements().unwrap());
    }

    let app = PeerLink::<MockTransport>::new(config).unwrap();
    assert_eq!(app.announcements().len(), 1);
    assert!(!app.has_new_announcements().unwrap());
}
