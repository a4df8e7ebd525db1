//! Typed Prefs - strongly typed accessors over a persistent preference store
//!
//! Each setting is a typed accessor bound to a key, a value type and a
//! default, instead of stringly keyed calls to typed getters and setters.
//!
//! ```
//! use std::sync::Arc;
//! use typed_prefs::preference;
//! use typed_prefs::storage::{MemoryStore, PreferenceStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! preference!(store.clone(), let username: String);
//!
//! assert_eq!(username.get().unwrap(), "");
//! username.set("rick".to_string()).unwrap();
//! assert_eq!(store.get_string("username", "").unwrap(), "rick");
//! ```

pub mod domain;
pub mod storage;
pub mod delegate;
pub mod cli;

pub use delegate::{BoundPreference, DynPreference, Preference, PreferenceError, PreferenceType};
pub use domain::{KindError, PrefValue, StorageKind};
pub use storage::{Editor, FileStore, MemoryStore, PreferenceStore, SqliteStore, StoreError};
