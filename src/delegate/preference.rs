//! Statically typed preference accessors

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use super::PreferenceError;
use crate::domain::{PrefValue, StorageKind};
use crate::storage::{Editor, PreferenceStore, StoreError};

/// A Rust type that maps onto one [`StorageKind`].
///
/// Implemented for `String`, `BTreeSet<String>`, `HashSet<String>`, `i32`,
/// `i64`, `f32` and `bool`. The trait is sealed; any other type is rejected
/// at compile time.
pub trait PreferenceType: sealed::Sealed + Clone + Send + Sync + 'static {
    /// The kind this type is stored as
    const KIND: StorageKind;

    /// Value read when nothing is stored and no default is configured
    fn fallback() -> Self;

    /// Calls the store's typed getter for this kind
    fn read(store: &dyn PreferenceStore, key: &str, default: &Self) -> Result<Self, StoreError>;

    /// Records this value with the editor's typed setter
    fn write<'a>(self, editor: Editor<'a>, key: &str) -> Editor<'a>;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for std::collections::BTreeSet<String> {}
    impl Sealed for std::collections::HashSet<String> {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for bool {}
}

impl PreferenceType for String {
    const KIND: StorageKind = StorageKind::String;

    fn fallback() -> Self {
        String::new()
    }

    fn read(store: &dyn PreferenceStore, key: &str, default: &Self) -> Result<Self, StoreError> {
        store.get_string(key, default)
    }

    fn write<'a>(self, editor: Editor<'a>, key: &str) -> Editor<'a> {
        editor.put_string(key, self)
    }
}

impl PreferenceType for BTreeSet<String> {
    const KIND: StorageKind = StorageKind::StringSet;

    fn fallback() -> Self {
        BTreeSet::new()
    }

    fn read(store: &dyn PreferenceStore, key: &str, default: &Self) -> Result<Self, StoreError> {
        store.get_string_set(key, default)
    }

    fn write<'a>(self, editor: Editor<'a>, key: &str) -> Editor<'a> {
        editor.put(key, PrefValue::StringSet(self))
    }
}

impl PreferenceType for HashSet<String> {
    const KIND: StorageKind = StorageKind::StringSet;

    fn fallback() -> Self {
        HashSet::new()
    }

    fn read(store: &dyn PreferenceStore, key: &str, default: &Self) -> Result<Self, StoreError> {
        let default: BTreeSet<String> = default.iter().cloned().collect();
        Ok(store.get_string_set(key, &default)?.into_iter().collect())
    }

    fn write<'a>(self, editor: Editor<'a>, key: &str) -> Editor<'a> {
        editor.put_string_set(key, self)
    }
}

macro_rules! scalar_preference_type {
    ($ty:ty, $kind:ident, $fallback:expr, $get:ident, $put:ident) => {
        impl PreferenceType for $ty {
            const KIND: StorageKind = StorageKind::$kind;

            fn fallback() -> Self {
                $fallback
            }

            fn read(
                store: &dyn PreferenceStore,
                key: &str,
                default: &Self,
            ) -> Result<Self, StoreError> {
                store.$get(key, *default)
            }

            fn write<'a>(self, editor: Editor<'a>, key: &str) -> Editor<'a> {
                editor.$put(key, self)
            }
        }
    };
}

scalar_preference_type!(i32, Int, -1, get_int, put_int);
scalar_preference_type!(i64, Long, -1, get_long, put_long);
scalar_preference_type!(f32, Float, 0.0, get_float, put_float);
scalar_preference_type!(bool, Boolean, false, get_boolean, put_boolean);

/// Typed accessor for one preference.
///
/// The key is the explicit key when one was given, otherwise the binding
/// name supplied at each access. Nothing is cached: every read and write goes
/// to the store, and writes are committed before they return.
///
/// ```
/// use std::sync::Arc;
/// use typed_prefs::delegate::Preference;
/// use typed_prefs::storage::MemoryStore;
///
/// let store = Arc::new(MemoryStore::new());
/// let launches = Preference::<i32>::new(store).with_default(0);
///
/// assert_eq!(launches.get_for("launches").unwrap(), 0);
/// launches.set_for("launches", 1).unwrap();
/// assert_eq!(launches.get_for("launches").unwrap(), 1);
/// ```
pub struct Preference<T: PreferenceType> {
    store: Arc<dyn PreferenceStore>,
    key: Option<String>,
    default: Option<T>,
}

impl<T: PreferenceType> Preference<T> {
    /// Creates an accessor; construction never touches the store
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            key: None,
            default: None,
        }
    }

    /// Uses `key` instead of the binding name
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Value read when nothing is stored
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    pub fn kind(&self) -> StorageKind {
        T::KIND
    }

    /// The explicit key, if one was configured
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    /// The key used when this accessor is attached to `binding`
    pub fn effective_key<'a>(&'a self, binding: &'a str) -> &'a str {
        self.key.as_deref().unwrap_or(binding)
    }

    /// Reads the value for `binding`, or the configured default or fallback
    pub fn get_for(&self, binding: &str) -> Result<T, PreferenceError> {
        let key = self.effective_key(binding);
        log::trace!("Reading {} preference '{}'", T::KIND, key);

        let value = match &self.default {
            Some(default) => T::read(&*self.store, key, default)?,
            None => T::read(&*self.store, key, &T::fallback())?,
        };

        Ok(value)
    }

    /// Writes and commits the value for `binding`
    pub fn set_for(&self, binding: &str, value: T) -> Result<(), PreferenceError> {
        let key = self.effective_key(binding);
        log::debug!("Writing {} preference '{}'", T::KIND, key);

        value.write(Editor::new(&*self.store), key).commit()?;
        Ok(())
    }

    /// Attaches this accessor to a named binding
    pub fn bind(self, binding: impl Into<String>) -> BoundPreference<T> {
        BoundPreference {
            preference: self,
            binding: binding.into(),
        }
    }
}

impl<T: PreferenceType> Clone for Preference<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: PreferenceType + fmt::Debug> fmt::Debug for Preference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preference")
            .field("kind", &T::KIND)
            .field("key", &self.key)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// A [`Preference`] attached to a named binding.
///
/// Usually created with the [`preference!`](crate::preference) macro, which
/// uses the variable name as the binding.
pub struct BoundPreference<T: PreferenceType> {
    preference: Preference<T>,
    binding: String,
}

impl<T: PreferenceType> BoundPreference<T> {
    pub fn get(&self) -> Result<T, PreferenceError> {
        self.preference.get_for(&self.binding)
    }

    pub fn set(&self, value: T) -> Result<(), PreferenceError> {
        self.preference.set_for(&self.binding, value)
    }

    /// The key reads and writes currently go to
    pub fn key(&self) -> &str {
        self.preference.effective_key(&self.binding)
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    pub fn preference(&self) -> &Preference<T> {
        &self.preference
    }

    /// Detaches the accessor from its binding
    pub fn into_inner(self) -> Preference<T> {
        self.preference
    }
}

impl<T: PreferenceType> Clone for BoundPreference<T> {
    fn clone(&self) -> Self {
        Self {
            preference: self.preference.clone(),
            binding: self.binding.clone(),
        }
    }
}

/// Declare a local preference binding whose name is the default key.
///
/// ```
/// use std::sync::Arc;
/// use typed_prefs::preference;
/// use typed_prefs::storage::{MemoryStore, PreferenceStore};
///
/// let store = Arc::new(MemoryStore::new());
///
/// preference!(store.clone(), let dark_mode: bool);
/// preference!(store.clone(), let volume: i32 = 5, key = "audio.volume");
///
/// dark_mode.set(true).unwrap();
/// assert_eq!(volume.get().unwrap(), 5);
/// assert!(store.get_boolean("dark_mode", false).unwrap());
/// ```
#[macro_export]
macro_rules! preference {
    ($store:expr, let $name:ident : $ty:ty $(= $default:expr)? $(, key = $key:expr)? $(,)?) => {
        let $name = {
            let preference = $crate::delegate::Preference::<$ty>::new($store);
            $( let preference = preference.with_default($default); )?
            $( let preference = preference.with_key($key); )?
            preference.bind(stringify!($name))
        };
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    fn set_of(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strings_read_write() {
        let store = store();
        preference!(store.clone(), let string_preference: String);

        assert_eq!(string_preference.get().unwrap(), "");
        string_preference.set("I don't know about this".to_string()).unwrap();
        assert_eq!(string_preference.get().unwrap(), "I don't know about this");
        assert_eq!(
            store.get_string("string_preference", "").unwrap(),
            "I don't know about this"
        );
    }

    #[test]
    fn string_sets_read_write() {
        let store = store();
        preference!(store.clone(), let string_set_preference: BTreeSet<String>);

        assert!(string_set_preference.get().unwrap().is_empty());
        string_set_preference.set(set_of(&["one", "two"])).unwrap();

        let read = string_set_preference.get().unwrap();
        assert!(read.contains("one"));
        assert!(read.contains("two"));

        let direct = store
            .get_string_set("string_set_preference", &BTreeSet::new())
            .unwrap();
        assert_eq!(direct, set_of(&["one", "two"]));
    }

    #[test]
    fn hash_sets_share_the_string_set_kind() {
        let store = store();
        preference!(store.clone(), let tags: HashSet<String>, key = "tags");

        assert_eq!(tags.preference().kind(), StorageKind::StringSet);
        tags.set(["a".to_string(), "b".to_string()].into_iter().collect()).unwrap();

        let as_btree = Preference::<BTreeSet<String>>::new(store.clone()).with_key("tags");
        assert_eq!(as_btree.get_for("ignored").unwrap(), set_of(&["a", "b"]));
    }

    #[test]
    fn explicit_key_overrides_binding() {
        let store = store();
        preference!(store.clone(), let string_preference: String, key = "some_key");

        assert_eq!(string_preference.key(), "some_key");
        assert_eq!(string_preference.get().unwrap(), "");
        string_preference.set("value".to_string()).unwrap();

        assert_eq!(string_preference.get().unwrap(), "value");
        assert_eq!(store.get_string("some_key", "").unwrap(), "value");
        assert!(!store.contains("string_preference").unwrap());
    }

    #[test]
    fn ints_read_write() {
        let store = store();
        preference!(store.clone(), let int_preference: i32);

        assert_eq!(int_preference.get().unwrap(), -1);
        int_preference.set(42).unwrap();
        assert_eq!(int_preference.get().unwrap(), 42);
        assert_eq!(store.get_int("int_preference", -1).unwrap(), 42);
    }

    #[test]
    fn longs_read_write() {
        let store = store();
        preference!(store.clone(), let long_preference: i64);

        assert_eq!(long_preference.get().unwrap(), -1);
        long_preference.set(42).unwrap();
        assert_eq!(long_preference.get().unwrap(), 42);
        assert_eq!(store.get_long("long_preference", -1).unwrap(), 42);
    }

    #[test]
    fn floats_read_write() {
        let store = store();
        preference!(store.clone(), let float_preference: f32);

        assert_eq!(float_preference.get().unwrap(), 0.0);
        float_preference.set(42.0).unwrap();
        assert_eq!(float_preference.get().unwrap(), 42.0);
        assert_eq!(store.get_float("float_preference", 0.0).unwrap(), 42.0);
    }

    #[test]
    fn booleans_read_write() {
        let store = store();
        preference!(store.clone(), let bool_preference: bool);

        assert!(!bool_preference.get().unwrap());
        bool_preference.set(true).unwrap();
        assert!(bool_preference.get().unwrap());
        assert!(store.get_boolean("bool_preference", false).unwrap());
    }

    #[test]
    fn configured_default_replaces_fallback() {
        let store = store();
        preference!(store.clone(), let greeting: String = "hello".to_string());
        preference!(store.clone(), let retries: i32 = 3);

        assert_eq!(greeting.get().unwrap(), "hello");
        assert_eq!(retries.get().unwrap(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn key_is_derived_per_access() {
        let store = store();
        let shared = Preference::<i32>::new(store.clone());

        shared.set_for("first", 1).unwrap();
        shared.set_for("second", 2).unwrap();

        assert_eq!(shared.get_for("first").unwrap(), 1);
        assert_eq!(shared.get_for("second").unwrap(), 2);
        assert_eq!(shared.effective_key("third"), "third");
    }

    #[test]
    fn accessors_on_same_key_see_each_other() {
        let store = store();
        let writer = Preference::<String>::new(store.clone()).bind("shared");
        let reader = Preference::<String>::new(store.clone()).with_key("shared").bind("other");

        writer.set("fresh".to_string()).unwrap();
        assert_eq!(reader.get().unwrap(), "fresh");
    }

    #[test]
    fn reading_a_value_of_another_kind_fails() {
        let store = store();
        preference!(store.clone(), let count: i32, key = "slot");
        preference!(store.clone(), let label: String, key = "slot");

        count.set(7).unwrap();
        let err = label.get().unwrap_err();
        assert!(matches!(
            err,
            PreferenceError::Store(StoreError::WrongKind { .. })
        ));
    }

    #[test]
    fn empty_binding_without_key_is_invalid() {
        let pref = Preference::<bool>::new(store());
        assert!(matches!(
            pref.set_for("", true),
            Err(PreferenceError::Store(StoreError::InvalidKey(_)))
        ));
    }

    #[test]
    fn construction_does_not_touch_store() {
        let store = store();
        let pref = Preference::<f32>::new(store.clone())
            .with_key("ratio")
            .with_default(0.25);

        assert_eq!(pref.kind(), StorageKind::Float);
        assert_eq!(pref.key(), Some("ratio"));
        assert_eq!(pref.default_value(), Some(&0.25));
        assert!(store.is_empty());
    }
}
