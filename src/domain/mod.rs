//! Domain types for typed preferences
//!
//! Storage kinds, tagged values and type-name resolution, without any I/O concerns.

mod kind;
mod value;

pub use kind::{KindError, StorageKind};
pub use value::{ParseValueError, PrefValue};
