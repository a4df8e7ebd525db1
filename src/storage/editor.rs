//! Pending mutations and the editor that commits them

use std::collections::BTreeMap;

use super::{validate_key, PreferenceStore, StoreError};
use crate::domain::PrefValue;

/// A set of pending mutations, committed atomically by a store.
///
/// `clear` applies before any other change; puts and removes then apply in
/// the order they were recorded, so the last change to a key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    clear: bool,
    changes: Vec<(String, Option<PrefValue>)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: PrefValue) {
        self.changes.push((key.into(), Some(value)));
    }

    pub fn remove(&mut self, key: impl Into<String>) {
        self.changes.push((key.into(), None));
    }

    pub fn clear(&mut self) {
        self.clear = true;
    }

    /// Returns true if the batch removes every existing entry
    pub fn clears(&self) -> bool {
        self.clear
    }

    /// Recorded changes in order; `None` marks a removal
    pub fn changes(&self) -> impl Iterator<Item = (&str, Option<&PrefValue>)> {
        self.changes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.clear && self.changes.is_empty()
    }

    /// Checks every key in the batch
    pub fn validate(&self) -> Result<(), StoreError> {
        self.changes.iter().try_for_each(|(key, _)| validate_key(key))
    }

    /// Applies the batch to an in-memory map
    pub fn apply_to(&self, entries: &mut BTreeMap<String, PrefValue>) {
        if self.clear {
            entries.clear();
        }

        for (key, value) in &self.changes {
            match value {
                Some(value) => {
                    entries.insert(key.clone(), value.clone());
                }
                None => {
                    entries.remove(key);
                }
            }
        }
    }
}

/// Collects typed puts against a store and commits them in one step.
///
/// ```
/// use typed_prefs::storage::{Editor, MemoryStore, PreferenceStore};
///
/// let store = MemoryStore::new();
/// Editor::new(&store)
///     .put_int("launches", 3)
///     .put_boolean("onboarded", true)
///     .commit()
///     .unwrap();
///
/// assert_eq!(store.get_int("launches", -1).unwrap(), 3);
/// ```
pub struct Editor<'a> {
    store: &'a dyn PreferenceStore,
    batch: Batch,
}

impl<'a> Editor<'a> {
    pub fn new(store: &'a dyn PreferenceStore) -> Self {
        Self {
            store,
            batch: Batch::new(),
        }
    }

    pub fn put(mut self, key: impl Into<String>, value: PrefValue) -> Self {
        self.batch.put(key, value);
        self
    }

    pub fn put_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(key, PrefValue::String(value.into()))
    }

    pub fn put_string_set<I, S>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.put(
            key,
            PrefValue::StringSet(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn put_int(self, key: impl Into<String>, value: i32) -> Self {
        self.put(key, PrefValue::Int(value))
    }

    pub fn put_long(self, key: impl Into<String>, value: i64) -> Self {
        self.put(key, PrefValue::Long(value))
    }

    pub fn put_float(self, key: impl Into<String>, value: f32) -> Self {
        self.put(key, PrefValue::Float(value))
    }

    pub fn put_boolean(self, key: impl Into<String>, value: bool) -> Self {
        self.put(key, PrefValue::Boolean(value))
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.batch.remove(key);
        self
    }

    pub fn clear(mut self) -> Self {
        self.batch.clear();
        self
    }

    /// Persists all pending changes before returning
    pub fn commit(self) -> Result<(), StoreError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        self.batch.validate()?;
        self.store.commit(&self.batch)
    }
}
