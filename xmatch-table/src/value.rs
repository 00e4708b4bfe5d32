//! Scalar cell values and identifier-key normal forms.
//!
//! A table cell is a [`Value`]: a typed scalar or null. Nulls are first
//! class — a missing coordinate or identifier excludes the row from
//! matching rather than failing the whole catalog, so every consumer of a
//! cell has to confront [`Value::Null`] explicitly.
//!
//! [`KeyValue`] is the hashable normal form used for identifier matching.
//! Floats are deliberately absent from it: bitwise float equality is not a
//! meaningful identifier comparison, so float columns are rejected as key
//! columns at configuration time.

use serde::{Deserialize, Serialize};

/// Declared scalar type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    Str,
}

/// A single table cell: a typed scalar or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value as an `f64`, for numeric cells.
    ///
    /// Returns `None` for nulls and strings; integer cells are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Null | Value::Str(_) => None,
        }
    }

    /// The scalar type of this cell, or `None` for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ColumnType::Int),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Str(_) => Some(ColumnType::Str),
        }
    }

    /// Converts the cell into its identifier-key normal form.
    ///
    /// Returns `None` for nulls (unmatchable) and for floats (not a valid
    /// key type — callers reject float key columns before reaching here).
    /// With `case_insensitive`, strings are folded to lowercase so that
    /// `"NGC300"` and `"ngc300"` compare equal.
    pub fn to_key(&self, case_insensitive: bool) -> Option<KeyValue> {
        match self {
            Value::Int(v) => Some(KeyValue::Int(*v)),
            Value::Str(s) => {
                if case_insensitive {
                    Some(KeyValue::Str(s.to_lowercase()))
                } else {
                    Some(KeyValue::Str(s.clone()))
                }
            }
            Value::Null | Value::Float(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Hashable normal form of an identifier cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    Int(i64),
    Str(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn test_as_f64_widens_ints() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Null.as_f64(), None);
        assert_eq!(Value::Str("3".into()).as_f64(), None);
    }

    #[test]
    fn test_to_key_case_folding() {
        let a = Value::Str("NGC300".into());
        let b = Value::Str("ngc300".into());
        assert_ne!(a.to_key(false), b.to_key(false));
        assert_eq!(a.to_key(true), b.to_key(true));
    }

    #[test]
    fn test_to_key_rejects_null_and_float() {
        assert_eq!(Value::Null.to_key(false), None);
        assert_eq!(Value::Float(1.0).to_key(false), None);
        assert_eq!(Value::Int(7).to_key(false), Some(KeyValue::Int(7)));
    }
}
