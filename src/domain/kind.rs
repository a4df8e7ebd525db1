//! Storage kinds and type-name resolution
//!
//! Every preference is stored as exactly one of six kinds. A kind is fixed
//! for the lifetime of an accessor and decides which typed store API is used.
//!
//! Type names resolve in this order, first match wins:
//! 1. text (`string`, `str`, `&str`, `text`) -> [`StorageKind::String`]
//! 2. collection of text (`string_set`, `set<string>`, `hashset<String>`, ...)
//!    -> [`StorageKind::StringSet`]
//! 3. exact names for the scalars (`int`/`i32`, `long`/`i64`, `float`/`f32`,
//!    `bool`/`boolean`)
//!
//! Matching ignores case and whitespace.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PrefValue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KindError {
    #[error("Unsupported preference type: {0}")]
    UnsupportedType(String),
}

/// The value categories a preference store understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    String,
    StringSet,
    Int,
    Long,
    Float,
    Boolean,
}

const TEXT_NAMES: &[&str] = &["string", "str", "&str", "text"];
const SET_NAMES: &[&str] = &["string_set", "string-set", "stringset"];
const SET_WRAPPERS: &[&str] = &["set<", "hashset<", "btreeset<"];

impl StorageKind {
    pub const ALL: [StorageKind; 6] = [
        StorageKind::String,
        StorageKind::StringSet,
        StorageKind::Int,
        StorageKind::Long,
        StorageKind::Float,
        StorageKind::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::String => "string",
            StorageKind::StringSet => "string_set",
            StorageKind::Int => "int",
            StorageKind::Long => "long",
            StorageKind::Float => "float",
            StorageKind::Boolean => "boolean",
        }
    }

    /// Resolves a type name to a storage kind.
    ///
    /// Fails with [`KindError::UnsupportedType`] carrying the name exactly as
    /// given when none of the six kinds match.
    pub fn resolve(type_name: &str) -> Result<Self, KindError> {
        let normalized: String = type_name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        if is_text(&normalized) {
            return Ok(StorageKind::String);
        }

        if is_text_collection(&normalized) {
            return Ok(StorageKind::StringSet);
        }

        match normalized.as_str() {
            "int" | "integer" | "i32" => Ok(StorageKind::Int),
            "long" | "i64" => Ok(StorageKind::Long),
            "float" | "f32" => Ok(StorageKind::Float),
            "bool" | "boolean" => Ok(StorageKind::Boolean),
            _ => Err(KindError::UnsupportedType(type_name.to_string())),
        }
    }

    /// Value returned by a read when nothing is stored and no default is configured
    pub fn fallback(&self) -> PrefValue {
        match self {
            StorageKind::String => PrefValue::String(String::new()),
            StorageKind::StringSet => PrefValue::StringSet(BTreeSet::new()),
            StorageKind::Int => PrefValue::Int(-1),
            StorageKind::Long => PrefValue::Long(-1),
            StorageKind::Float => PrefValue::Float(0.0),
            StorageKind::Boolean => PrefValue::Boolean(false),
        }
    }
}

fn is_text(name: &str) -> bool {
    TEXT_NAMES.contains(&name)
}

fn is_text_collection(name: &str) -> bool {
    if SET_NAMES.contains(&name) {
        return true;
    }

    SET_WRAPPERS.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix('>'))
            .is_some_and(is_text)
    })
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}
