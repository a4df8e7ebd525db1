//! In-memory preference store

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::{validate_key, Batch, PreferenceStore, StoreError};
use crate::domain::PrefValue;

/// Store that keeps entries in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, PrefValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with entries
    pub fn with_entries(entries: BTreeMap<String, PrefValue>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<PrefValue>, StoreError> {
        validate_key(key)?;
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn all(&self) -> Result<BTreeMap<String, PrefValue>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.clone())
    }

    fn commit(&self, batch: &Batch) -> Result<(), StoreError> {
        batch.validate()?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        batch.apply_to(&mut entries);
        log::debug!("Committed {} change(s) to memory store", batch.len());
        Ok(())
    }
}
