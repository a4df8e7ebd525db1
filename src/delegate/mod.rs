//! # Typed Accessors
//!
//! Strongly typed handles over single store entries.
//!
//! | Accessor | Kind chosen by | Values |
//! |----------|----------------|--------|
//! | [`Preference<T>`] | the type parameter `T` | `T` |
//! | [`BoundPreference<T>`] | the type parameter `T` | `T`, key from its binding name |
//! | [`DynPreference`] | a [`StorageKind`](crate::domain::StorageKind) or type name | [`PrefValue`](crate::domain::PrefValue) |
//!
//! ## Effective Key
//!
//! An accessor built with an explicit key always uses it. Otherwise the key
//! is the binding name passed at each access (`get_for`, `set_for`), fixed by
//! [`Preference::bind`], or taken from the variable name by
//! [`preference!`](crate::preference).
//!
//! ## Fallbacks
//!
//! Reads of an absent key return the configured default, or else: `""`, the
//! empty set, `-1`, `-1`, `0.0`, `false`.

mod dynamic;
mod preference;

use thiserror::Error;

use crate::domain::{KindError, StorageKind};
use crate::storage::StoreError;

pub use dynamic::DynPreference;
pub use preference::{BoundPreference, Preference, PreferenceType};

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error(transparent)]
    Kind(#[from] KindError),

    #[error("Type mismatch: expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: StorageKind,
        found: StorageKind,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
