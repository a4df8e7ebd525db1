//! Tagged preference values
//!
//! Stores hold [`PrefValue`]s so that every entry remembers its kind. The
//! serialized form is `{"kind": "int", "value": 42}`.
//!
//! Finite floats serialize as JSON numbers. Non-finite floats serialize as
//! strings (`"inf"`, `"-inf"`, `"NaN"`, or `"NaN:0x7fc00001"` for a NaN with a
//! non-default payload) so that every `f32` survives a store round trip.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::StorageKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseValueError {
    #[error("Invalid {kind} value: '{raw}'")]
    Invalid { kind: StorageKind, raw: String },
}

/// A stored value of exactly one [`StorageKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PrefValue {
    String(String),
    StringSet(BTreeSet<String>),
    Int(i32),
    Long(i64),
    Float(#[serde(with = "float_repr")] f32),
    Boolean(bool),
}

impl PrefValue {
    pub fn kind(&self) -> StorageKind {
        match self {
            PrefValue::String(_) => StorageKind::String,
            PrefValue::StringSet(_) => StorageKind::StringSet,
            PrefValue::Int(_) => StorageKind::Int,
            PrefValue::Long(_) => StorageKind::Long,
            PrefValue::Float(_) => StorageKind::Float,
            PrefValue::Boolean(_) => StorageKind::Boolean,
        }
    }

    /// Parses command-line text as a value of the given kind.
    ///
    /// String sets are comma separated; items are trimmed and empty items
    /// dropped, so an item can never contain a comma in this form. Floats
    /// accept anything `f32::from_str` does, including `inf` and `NaN`.
    /// Booleans accept `true/false`, `yes/no`, `on/off` and `1/0`.
    pub fn parse(kind: StorageKind, raw: &str) -> Result<Self, ParseValueError> {
        let invalid = || ParseValueError::Invalid {
            kind,
            raw: raw.to_string(),
        };

        let value = match kind {
            StorageKind::String => PrefValue::String(raw.to_string()),
            StorageKind::StringSet => PrefValue::StringSet(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            StorageKind::Int => PrefValue::Int(raw.trim().parse().map_err(|_| invalid())?),
            StorageKind::Long => PrefValue::Long(raw.trim().parse().map_err(|_| invalid())?),
            StorageKind::Float => PrefValue::Float(raw.trim().parse().map_err(|_| invalid())?),
            StorageKind::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => PrefValue::Boolean(true),
                "false" | "no" | "off" | "0" => PrefValue::Boolean(false),
                _ => return Err(invalid()),
            },
        };

        Ok(value)
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::String(s) => f.write_str(s),
            PrefValue::StringSet(set) => {
                let items: Vec<&str> = set.iter().map(String::as_str).collect();
                f.write_str(&items.join(","))
            }
            PrefValue::Int(n) => write!(f, "{}", n),
            PrefValue::Long(n) => write!(f, "{}", n),
            PrefValue::Float(n) => write!(f, "{}", n),
            PrefValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Serde adapter keeping non-finite `f32`s representable in JSON
mod float_repr {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    const NAN_PREFIX: &str = "NaN:";

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        let value = *value;
        if value.is_finite() {
            serializer.serialize_f32(value)
        } else if value.is_nan() {
            if value.to_bits() == f32::NAN.to_bits() {
                serializer.serialize_str("NaN")
            } else {
                serializer.serialize_str(&format!("{}{:#010x}", NAN_PREFIX, value.to_bits()))
            }
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl Visitor<'_> for FloatVisitor {
        type Value = f32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"inf\", \"-inf\", \"NaN\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f32, E> {
            Ok(v as f32)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f32, E> {
            Ok(v as f32)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f32, E> {
            Ok(v as f32)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f32, E> {
            let invalid = || E::invalid_value(de::Unexpected::Str(v), &self);

            match v {
                "inf" => Ok(f32::INFINITY),
                "-inf" => Ok(f32::NEG_INFINITY),
                "NaN" => Ok(f32::NAN),
                _ => {
                    let hex = v
                        .strip_prefix(NAN_PREFIX)
                        .and_then(|bits| bits.strip_prefix("0x"))
                        .ok_or_else(invalid)?;
                    let value = u32::from_str_radix(hex, 16)
                        .map(f32::from_bits)
                        .map_err(|_| invalid())?;
                    if value.is_nan() {
                        Ok(value)
                    } else {
                        Err(invalid())
                    }
                }
            }
        }
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

impl From<BTreeSet<String>> for PrefValue {
    fn from(value: BTreeSet<String>) -> Self {
        PrefValue::StringSet(value)
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        PrefValue::Int(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Long(value)
    }
}

impl From<f32> for PrefValue {
    fn from(value: f32) -> Self {
        PrefValue::Float(value)
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalars() {
        assert_eq!(PrefValue::parse(StorageKind::Int, " 42 "), Ok(PrefValue::Int(42)));
        assert_eq!(
            PrefValue::parse(StorageKind::Long, "9000000000"),
            Ok(PrefValue::Long(9_000_000_000))
        );
        assert_eq!(PrefValue::parse(StorageKind::Float, "1.5"), Ok(PrefValue::Float(1.5)));
        assert_eq!(PrefValue::parse(StorageKind::Boolean, "Yes"), Ok(PrefValue::Boolean(true)));
        assert_eq!(PrefValue::parse(StorageKind::Boolean, "0"), Ok(PrefValue::Boolean(false)));
    }

    #[test]
    fn parse_keeps_strings_verbatim() {
        assert_eq!(
            PrefValue::parse(StorageKind::String, "  padded "),
            Ok(PrefValue::String("  padded ".to_string()))
        );
    }

    #[test]
    fn parse_string_set_splits_on_commas() {
        let value = PrefValue::parse(StorageKind::StringSet, "b, a,,a ").unwrap();
        let expected: BTreeSet<String> = ["a", "b"].into_iter().map(String::from).collect();
        assert_eq!(value, PrefValue::StringSet(expected));
    }

    #[test]
    fn parse_rejects_bad_numbers() {
        let err = PrefValue::parse(StorageKind::Int, "forty-two").unwrap_err();
        assert_eq!(
            err,
            ParseValueError::Invalid {
                kind: StorageKind::Int,
                raw: "forty-two".to_string()
            }
        );
        assert!(PrefValue::parse(StorageKind::Int, "3000000000").is_err());
        assert!(PrefValue::parse(StorageKind::Boolean, "maybe").is_err());
    }

    #[test]
    fn display_joins_sets_in_order() {
        let value = PrefValue::parse(StorageKind::StringSet, "z,m,a").unwrap();
        assert_eq!(value.to_string(), "a,m,z");
        assert_eq!(PrefValue::Boolean(true).to_string(), "true");
    }

    #[test]
    fn parse_accepts_non_finite_floats() {
        assert_eq!(
            PrefValue::parse(StorageKind::Float, "inf"),
            Ok(PrefValue::Float(f32::INFINITY))
        );
        match PrefValue::parse(StorageKind::Float, "NaN") {
            Ok(PrefValue::Float(n)) => assert!(n.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_finite_floats_serialize_as_strings() {
        let json = serde_json::to_value(PrefValue::Float(f32::NEG_INFINITY)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "float", "value": "-inf"}));

        let json = serde_json::to_value(PrefValue::Float(f32::NAN)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "float", "value": "NaN"}));

        let payload = f32::from_bits(0xffc0_0001);
        let json = serde_json::to_value(PrefValue::Float(payload)).unwrap();
        assert_eq!(json["value"], "NaN:0xffc00001");
    }

    #[test]
    fn every_float_class_survives_json() {
        let samples = [
            0.0,
            -0.0,
            1.25,
            f32::MIN_POSITIVE / 4.0,
            f32::MAX,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            f32::from_bits(0x7fc0_1234),
        ];

        for sample in samples {
            let text = serde_json::to_string(&PrefValue::Float(sample)).unwrap();
            match serde_json::from_str(&text).unwrap() {
                PrefValue::Float(back) => assert_eq!(back.to_bits(), sample.to_bits(), "{text}"),
                other => panic!("{text} decoded as {:?}", other),
            }
        }
    }

    #[test]
    fn float_accepts_integral_json_and_rejects_junk() {
        let back: PrefValue =
            serde_json::from_value(serde_json::json!({"kind": "float", "value": 3})).unwrap();
        assert_eq!(back, PrefValue::Float(3.0));

        for junk in ["infinity", "NaN:0x3f800000", "NaN:zz"] {
            let result: Result<PrefValue, _> =
                serde_json::from_value(serde_json::json!({"kind": "float", "value": junk}));
            assert!(result.is_err(), "{junk}");
        }
        assert!(serde_json::from_value::<PrefValue>(
            serde_json::json!({"kind": "float", "value": null})
        )
        .is_err());
    }

    #[test]
    fn serialized_form_is_tagged() {
        let json = serde_json::to_value(PrefValue::Int(42)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "int", "value": 42}));

        let back: PrefValue =
            serde_json::from_value(serde_json::json!({"kind": "string_set", "value": ["x"]}))
                .unwrap();
        assert_eq!(back.kind(), StorageKind::StringSet);
    }
}
