//! # Storage Layer
//!
//! The persistent key-value stores that typed accessors read and write.
//!
//! ## Backends
//!
//! | Store | Persistence | Concurrency |
//! |-------|-------------|-------------|
//! | [`MemoryStore`] | none | `RwLock` |
//! | [`FileStore`] | JSON document | `RwLock` + `fs2` lock file |
//! | [`SqliteStore`] | SQLite table | `Mutex<Connection>` + transactions |
//!
//! ## Commit Semantics
//!
//! Mutations are collected by an [`Editor`] into a [`Batch`] and handed to
//! [`PreferenceStore::commit`], which must not return until the batch is
//! durable and visible to every later read through the same store.
//!
//! ## Typed Reads
//!
//! The `get_*` methods return the stored value, the supplied default when the
//! key is absent, or [`StoreError::WrongKind`] when the key holds a value of
//! another kind.

mod config;
mod editor;
mod file;
mod memory;
mod sqlite;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{PrefValue, StorageKind};

pub use config::{Backend, Config, ConfigError};
pub use editor::{Batch, Editor};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Preference '{key}' holds a {found} value, not {expected}")]
    WrongKind {
        key: String,
        expected: StorageKind,
        found: StorageKind,
    },

    #[error("Invalid preference key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse preference file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Keys must be non-empty
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A string-keyed store of typed preference values
pub trait PreferenceStore: Send + Sync {
    /// Returns the stored value, if any
    fn read(&self, key: &str) -> Result<Option<PrefValue>, StoreError>;

    /// Returns a snapshot of every entry
    fn all(&self) -> Result<BTreeMap<String, PrefValue>, StoreError>;

    /// Durably applies a batch of changes
    fn commit(&self, batch: &Batch) -> Result<(), StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read(key)?.is_some())
    }

    fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError> {
        match self.read(key)? {
            Some(PrefValue::String(s)) => Ok(s),
            Some(other) => Err(wrong_kind(key, StorageKind::String, &other)),
            None => Ok(default.to_string()),
        }
    }

    fn get_string_set(
        &self,
        key: &str,
        default: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        match self.read(key)? {
            Some(PrefValue::StringSet(set)) => Ok(set),
            Some(other) => Err(wrong_kind(key, StorageKind::StringSet, &other)),
            None => Ok(default.clone()),
        }
    }

    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError> {
        match self.read(key)? {
            Some(PrefValue::Int(n)) => Ok(n),
            Some(other) => Err(wrong_kind(key, StorageKind::Int, &other)),
            None => Ok(default),
        }
    }

    fn get_long(&self, key: &str, default: i64) -> Result<i64, StoreError> {
        match self.read(key)? {
            Some(PrefValue::Long(n)) => Ok(n),
            Some(other) => Err(wrong_kind(key, StorageKind::Long, &other)),
            None => Ok(default),
        }
    }

    fn get_float(&self, key: &str, default: f32) -> Result<f32, StoreError> {
        match self.read(key)? {
            Some(PrefValue::Float(n)) => Ok(n),
            Some(other) => Err(wrong_kind(key, StorageKind::Float, &other)),
            None => Ok(default),
        }
    }

    fn get_boolean(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        match self.read(key)? {
            Some(PrefValue::Boolean(b)) => Ok(b),
            Some(other) => Err(wrong_kind(key, StorageKind::Boolean, &other)),
            None => Ok(default),
        }
    }
}

fn wrong_kind(key: &str, expected: StorageKind, found: &PrefValue) -> StoreError {
    StoreError::WrongKind {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
