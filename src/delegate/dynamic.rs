//! Accessors whose kind is chosen at runtime

use std::fmt;
use std::sync::Arc;

use super::PreferenceError;
use crate::domain::{PrefValue, StorageKind};
use crate::storage::{Editor, PreferenceStore};

/// Preference accessor over [`PrefValue`]s with a kind fixed at construction.
///
/// Used where the type arrives as data, e.g. a `--type` flag. Values whose
/// kind differs from the accessor's are rejected with
/// [`PreferenceError::TypeMismatch`] and never written.
pub struct DynPreference {
    kind: StorageKind,
    store: Arc<dyn PreferenceStore>,
    key: Option<String>,
    default: Option<PrefValue>,
}

impl DynPreference {
    pub fn new(kind: StorageKind, store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            kind,
            store,
            key: None,
            default: None,
        }
    }

    /// Resolves `type_name` to a kind and creates the accessor.
    ///
    /// Fails before the store is touched if the type is unsupported.
    pub fn resolve(type_name: &str, store: Arc<dyn PreferenceStore>) -> Result<Self, PreferenceError> {
        let kind = StorageKind::resolve(type_name)?;
        Ok(Self::new(kind, store))
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the default; its kind must match the accessor's
    pub fn with_default(mut self, default: PrefValue) -> Result<Self, PreferenceError> {
        self.check(&default)?;
        self.default = Some(default);
        Ok(self)
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn effective_key<'a>(&'a self, binding: &'a str) -> &'a str {
        self.key.as_deref().unwrap_or(binding)
    }

    pub fn get(&self, binding: &str) -> Result<PrefValue, PreferenceError> {
        let key = self.effective_key(binding);
        let store = &*self.store;
        log::trace!("Reading {} preference '{}'", self.kind, key);

        // The default always has the accessor's kind, so matching on it
        // dispatches on the kind
        let default = match &self.default {
            Some(default) => default.clone(),
            None => self.kind.fallback(),
        };

        let value = match default {
            PrefValue::String(d) => PrefValue::String(store.get_string(key, &d)?),
            PrefValue::StringSet(d) => PrefValue::StringSet(store.get_string_set(key, &d)?),
            PrefValue::Int(d) => PrefValue::Int(store.get_int(key, d)?),
            PrefValue::Long(d) => PrefValue::Long(store.get_long(key, d)?),
            PrefValue::Float(d) => PrefValue::Float(store.get_float(key, d)?),
            PrefValue::Boolean(d) => PrefValue::Boolean(store.get_boolean(key, d)?),
        };

        Ok(value)
    }

    pub fn set(&self, binding: &str, value: PrefValue) -> Result<(), PreferenceError> {
        self.check(&value)?;

        let key = self.effective_key(binding);
        log::debug!("Writing {} preference '{}'", self.kind, key);

        Editor::new(&*self.store).put(key, value).commit()?;
        Ok(())
    }

    fn check(&self, value: &PrefValue) -> Result<(), PreferenceError> {
        if value.kind() != self.kind {
            return Err(PreferenceError::TypeMismatch {
                expected: self.kind,
                found: value.kind(),
            });
        }
        Ok(())
    }
}

impl Clone for DynPreference {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            default: self.default.clone(),
        }
    }
}

impl fmt::Debug for DynPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynPreference")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
