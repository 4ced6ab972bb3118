// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Configuration
//!
//! Configuration types for the PeerLink API layer.

use std::path::PathBuf;

use crate::network::{RelayClientConfig, TransportConfig};
use crate::peer::NEGOTIATION_TIMEOUT_MS;

/// Configuration for a PeerLink instance.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the primary state database.
    pub storage_path: PathBuf,

    /// Path of the backup state database. Defaults to the primary path with
    /// a `.bak` suffix.
    pub backup_path: Option<PathBuf>,

    /// Relay server configuration.
    pub relay: RelayConfig,

    /// Peer transport configuration.
    pub peer: PeerConfig,

    /// Persist state after every mutating operation.
    pub auto_save: bool,

    /// Bearer token authorizing announcement broadcasts. Absent on ordinary
    /// installations.
    pub broadcast_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            storage_path: PathBuf::from("./peerlink_data/state.db"),
            backup_path: None,
            relay: RelayConfig::default(),
            peer: PeerConfig::default(),
            auto_save: true,
            broadcast_token: None,
        }
    }
}

impl AppConfig {
    /// Creates a configuration with the given primary storage path.
    pub fn with_storage_path(storage_path: impl Into<PathBuf>) -> Self {
        AppConfig {
            storage_path: storage_path.into(),
            ..Default::default()
        }
    }

    /// Sets the relay server URL.
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay.server_url = url.into();
        self
    }

    /// Sets an explicit backup database path.
    pub fn with_backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_path = Some(path.into());
        self
    }

    /// Grants this installation the broadcast credential.
    pub fn with_broadcast_token(mut self, token: impl Into<String>) -> Self {
        self.broadcast_token = Some(token.into());
        self
    }

    /// Disables auto-save.
    pub fn without_auto_save(mut self) -> Self {
        self.auto_save = false;
        self
    }

    /// The effective backup database path.
    pub fn effective_backup_path(&self) -> PathBuf {
        self.backup_path.clone().unwrap_or_else(|| {
            let mut path = self.storage_path.clone();
            path.as_mut_os_string().push(".bak");
            path
        })
    }
}

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay server URL.
    pub server_url: String,

    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Read/write timeout in milliseconds.
    pub io_timeout_ms: u64,

    /// Maximum reconnection attempts.
    pub max_reconnect_attempts: u32,

    /// Base delay for exponential backoff (milliseconds).
    pub reconnect_base_delay_ms: u64,

    /// How many envelope ids to remember for deduplication.
    pub dedup_window: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        RelayConfig {
            server_url: transport.server_url,
            connect_timeout_ms: transport.connect_timeout_ms,
            io_timeout_ms: transport.io_timeout_ms,
            max_reconnect_attempts: transport.max_reconnect_attempts,
            reconnect_base_delay_ms: transport.reconnect_base_delay_ms,
            dedup_window: RelayClientConfig::default().dedup_window,
        }
    }
}

impl RelayConfig {
    /// Converts into the relay client configuration.
    pub fn to_client_config(&self) -> RelayClientConfig {
        RelayClientConfig {
            transport: TransportConfig {
                server_url: self.server_url.clone(),
                connect_timeout_ms: self.connect_timeout_ms,
                io_timeout_ms: self.io_timeout_ms,
                max_reconnect_attempts: self.max_reconnect_attempts,
                reconnect_base_delay_ms: self.reconnect_base_delay_ms,
            },
            dedup_window: self.dedup_window,
        }
    }
}

/// Peer transport configuration.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// How long a pending offer waits for its answer (milliseconds).
    pub negotiation_timeout_ms: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            negotiation_timeout_ms: NEGOTIATION_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_defaults_to_bak_suffix() {
        let config = AppConfig::with_storage_path("/data/state.db");
        assert_eq!(
            config.effective_backup_path(),
            PathBuf::from("/data/state.db.bak")
        );
    }

    #[test]
    fn test_explicit_backup_path_wins() {
        let config =
            AppConfig::with_storage_path("/data/state.db").with_backup_path("/mnt/backup.db");
        assert_eq!(config.effective_backup_path(), PathBuf::from("/mnt/backup.db"));
    }

    #[test]
    fn test_relay_config_converts() {
        let mut relay = RelayConfig::default();
        relay.server_url = "ws://localhost:3001".into();

        let client = relay.to_client_config();
        assert_eq!(client.transport.server_url, "ws://localhost:3001");
    }
}
