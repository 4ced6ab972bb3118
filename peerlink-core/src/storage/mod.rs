// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! Local-first persistence for the whole application state. Uses SQLite as a
//! key-value store of JSON documents, one key per top-level collection, with
//! an optional backup database written alongside the primary.
//!
//! Write path: the primary write must succeed; the backup write is
//! best-effort and only logged on failure. Read path: a key missing or
//! unparseable in the primary falls back to the backup, and a backup hit
//! repairs the primary in place.

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod keys;
#[cfg(not(feature = "testing"))]
mod keys;

#[cfg(feature = "testing")]
pub mod recovery;
#[cfg(not(feature = "testing"))]
mod recovery;

#[cfg(feature = "testing")]
pub mod state;
#[cfg(not(feature = "testing"))]
mod state;

pub use error::StorageError;
pub use recovery::{reconcile, StateSnapshot};

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// SQLite-backed key-value store with a best-effort backup replica.
pub struct Store {
    primary: Connection,
    backup: Option<Connection>,
}

impl Store {
    /// Opens (or creates) the primary and backup databases.
    ///
    /// After opening, keys present on one side but missing on the other are
    /// copied across, so a fresh or wiped primary is healed from the backup
    /// before the first read.
    pub fn open<P: AsRef<Path>>(primary_path: P, backup_path: P) -> Result<Self, StorageError> {
        let primary = Connection::open(primary_path)?;
        let backup = Connection::open(backup_path)?;
        init_schema(&primary)?;
        init_schema(&backup)?;

        let store = Store {
            primary,
            backup: Some(backup),
        };
        store.heal_missing_keys()?;
        Ok(store)
    }

    /// Creates an in-memory store without a backup (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let primary = Connection::open_in_memory()?;
        init_schema(&primary)?;
        Ok(Store {
            primary,
            backup: None,
        })
    }

    /// Reads and deserializes the value stored under `key`.
    ///
    /// A key missing from the primary, or holding a document that no longer
    /// parses, is served from the backup; the backup copy is then written
    /// back to the primary.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        if let Some(raw) = read_raw(&self.primary, key)? {
            match serde_json::from_str(&raw) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => {
                    warn!(key, error = %e, "primary value corrupt, trying backup");
                }
            }
        }

        let Some(backup) = &self.backup else {
            return Ok(None);
        };
        let Some(raw) = read_raw(backup, key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Err(e) = write_raw(&self.primary, key, &raw) {
            warn!(key, error = %e, "failed to repair primary from backup");
        }
        Ok(Some(value))
    }

    /// Serializes and stores `value` under `key` in both databases.
    ///
    /// The primary write is authoritative; a backup failure is logged and
    /// otherwise ignored so a bad replica never blocks the app.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        write_raw(&self.primary, key, &raw)?;
        if let Some(backup) = &self.backup {
            if let Err(e) = write_raw(backup, key, &raw) {
                warn!(key, error = %e, "backup write failed");
            }
        }
        Ok(())
    }

    /// Removes `key` from both databases.
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.primary
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        if let Some(backup) = &self.backup {
            if let Err(e) = backup.execute("DELETE FROM kv WHERE key = ?1", params![key]) {
                warn!(key, error = %e, "backup delete failed");
            }
        }
        Ok(())
    }

    /// Wipes every key from both databases. Used by the "clear all data"
    /// flow.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.primary.execute("DELETE FROM kv", [])?;
        if let Some(backup) = &self.backup {
            if let Err(e) = backup.execute("DELETE FROM kv", []) {
                warn!(error = %e, "backup clear failed");
            }
        }
        Ok(())
    }

    /// Copies keys present on exactly one side to the other. Raw values are
    /// copied verbatim; no merging happens here.
    fn heal_missing_keys(&self) -> Result<(), StorageError> {
        let Some(backup) = &self.backup else {
            return Ok(());
        };
        for key in keys::ALL_KEYS {
            let in_primary = read_raw(&self.primary, key)?;
            let in_backup = read_raw(backup, key)?;
            match (in_primary, in_backup) {
                (None, Some(raw)) => {
                    write_raw(&self.primary, key, &raw)?;
                }
                (Some(raw), None) => {
                    if let Err(e) = write_raw(backup, key, &raw) {
                        warn!(key, error = %e, "backup heal failed");
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn primary(&self) -> &Connection {
        &self.primary
    }

    pub(crate) fn backup(&self) -> Option<&Connection> {
        self.backup.as_ref()
    }
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub(crate) fn read_raw(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    let result = conn.query_row(
        "SELECT value FROM kv WHERE key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(raw) => Ok(Some(raw)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Database(e)),
    }
}

pub(crate) fn write_raw(conn: &Connection, key: &str, raw: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![key, raw],
    )?;
    Ok(())
}
