//! ASDP metadata values.
//!
//! A metadata value holds exactly one of three types: integer, float, or
//! text. Values are plain data with no interior sharing; cloning a value
//! copies it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant of a [`MetadataValue`].
///
/// The numeric codes (0/1/2) match the column encoding used by relational
/// catalog backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataKind {
    Int,
    Float,
    Text,
}

impl MetadataKind {
    /// Stable integer code for storage backends.
    pub fn code(self) -> i64 {
        match self {
            MetadataKind::Int => 0,
            MetadataKind::Float => 1,
            MetadataKind::Text => 2,
        }
    }
}

/// A single ASDP metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// The active variant's kind.
    pub fn kind(&self) -> MetadataKind {
        match self {
            MetadataValue::Int(_) => MetadataKind::Int,
            MetadataValue::Float(_) => MetadataKind::Float,
            MetadataValue::Text(_) => MetadataKind::Text,
        }
    }

    /// Integer value, or 0 if the value is not an integer.
    pub fn as_int(&self) -> i64 {
        match self {
            MetadataValue::Int(i) => *i,
            _ => 0,
        }
    }

    /// Float value, or 0.0 if the value is not a float.
    pub fn as_float(&self) -> f64 {
        match self {
            MetadataValue::Float(f) => *f,
            _ => 0.0,
        }
    }

    /// Text value, or the empty string if the value is not text.
    pub fn as_text(&self) -> &str {
        match self {
            MetadataValue::Text(s) => s,
            _ => "",
        }
    }

    /// Whether the value is integer- or float-typed.
    pub fn is_numeric(&self) -> bool {
        matches!(self, MetadataValue::Int(_) | MetadataValue::Float(_))
    }

    /// Numeric value as a double; integers are cast. Only meaningful when
    /// [`is_numeric`](Self::is_numeric) is true (returns 0.0 for text).
    pub fn as_numeric(&self) -> f64 {
        match self {
            MetadataValue::Int(i) => *i as f64,
            MetadataValue::Float(f) => *f,
            MetadataValue::Text(_) => 0.0,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Text(s) => write!(f, "{}", s),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(MetadataValue::Int(3).kind(), MetadataKind::Int);
        assert_eq!(MetadataValue::Float(1.5).kind(), MetadataKind::Float);
        assert_eq!(
            MetadataValue::Text("x".to_string()).kind(),
            MetadataKind::Text
        );
    }

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(MetadataKind::Int.code(), 0);
        assert_eq!(MetadataKind::Float.code(), 1);
        assert_eq!(MetadataKind::Text.code(), 2);
    }

    #[test]
    fn numeric_values() {
        assert!(MetadataValue::Int(7).is_numeric());
        assert!(MetadataValue::Float(2.5).is_numeric());
        assert!(!MetadataValue::Text("7".to_string()).is_numeric());

        assert_eq!(MetadataValue::Int(7).as_numeric(), 7.0);
        assert_eq!(MetadataValue::Float(2.5).as_numeric(), 2.5);
    }

    #[test]
    fn mismatched_accessors_return_defaults() {
        let text = MetadataValue::Text("abc".to_string());
        assert_eq!(text.as_int(), 0);
        assert_eq!(text.as_float(), 0.0);

        let num = MetadataValue::Int(4);
        assert_eq!(num.as_text(), "");
    }

    #[test]
    fn serde_round_trip() {
        let values = vec![
            MetadataValue::Int(-3),
            MetadataValue::Float(0.25),
            MetadataValue::Text("ctx".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        let back: Vec<MetadataValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(values, back);
    }
}
