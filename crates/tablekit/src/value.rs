//! Dynamic SQL values and typed conversions.
//!
//! Bound parameters and raw row cells are carried as [`Value`]. Entity fields
//! stay strongly typed; [`SqlValue`] converts between the two at the column
//! binding boundary.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A single SQL value, either bound as a parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short variant name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::SmallInt(_) => "SmallInt",
            Value::Int(_) => "Int",
            Value::BigInt(_) => "BigInt",
            Value::Double(_) => "Double",
            Value::Text(_) => "Text",
            Value::Bytes(_) => "Bytes",
            Value::Uuid(_) => "Uuid",
            Value::Timestamp(_) => "Timestamp",
            Value::Json(_) => "Json",
        }
    }

    /// Integer payload widened to `i64`, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::SmallInt(v) => Some(i64::from(v)),
            Value::Int(v) => Some(i64::from(v)),
            Value::BigInt(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Conversion between a typed Rust value and a [`Value`].
///
/// `from_value` returns a plain message on failure; callers attach the column
/// name when turning it into an [`OrmError`](crate::OrmError).
pub trait SqlValue: Sized + Send + Sync + 'static {
    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch<T>(expected: &str, got: &Value) -> Result<T, String> {
    if got.is_null() {
        Err(format!("unexpected NULL, expected {expected}"))
    } else {
        Err(format!("expected {expected}, found {}", got.type_name()))
    }
}

impl SqlValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl SqlValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(v),
            other => mismatch("Bool", &other),
        }
    }
}

impl SqlValue for i16 {
    fn into_value(self) -> Value {
        Value::SmallInt(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value.as_i64() {
            Some(v) => i16::try_from(v).map_err(|_| format!("{v} does not fit in SmallInt")),
            None => mismatch("SmallInt", &value),
        }
    }
}

impl SqlValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value.as_i64() {
            Some(v) => i32::try_from(v).map_err(|_| format!("{v} does not fit in Int")),
            None => mismatch("Int", &value),
        }
    }
}

impl SqlValue for i64 {
    fn into_value(self) -> Value {
        Value::BigInt(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value.as_i64() {
            Some(v) => Ok(v),
            None => mismatch("BigInt", &value),
        }
    }
}

impl SqlValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Double(v) => Ok(v),
            other => mismatch("Double", &other),
        }
    }
}

impl SqlValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(v) => Ok(v),
            other => mismatch("Text", &other),
        }
    }
}

impl SqlValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => mismatch("Bytes", &other),
        }
    }
}

impl SqlValue for Uuid {
    fn into_value(self) -> Value {
        Value::Uuid(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(v),
            other => mismatch("Uuid", &other),
        }
    }
}

impl SqlValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => mismatch("Timestamp", &other),
        }
    }
}

impl SqlValue for serde_json::Value {
    fn into_value(self) -> Value {
        Value::Json(self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v),
            other => mismatch("Json", &other),
        }
    }
}

impl<T: SqlValue> SqlValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Identifier type for tables that have no identifier column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoId;

impl SqlValue for NoId {
    fn into_value(self) -> Value {
        Value::Null
    }

    fn from_value(_value: Value) -> Result<Self, String> {
        Err("table has no identifier column".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_and_narrow_losslessly() {
        assert_eq!(i64::from_value(Value::Int(7)), Ok(7));
        assert_eq!(i32::from_value(Value::BigInt(42)), Ok(42));
        assert!(i32::from_value(Value::BigInt(i64::MAX)).is_err());
        assert!(i16::from_value(Value::Int(70_000)).is_err());
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(Some(5i32).into_value(), Value::Int(5));
        assert_eq!(Option::<i32>::None.into_value(), Value::Null);
    }

    #[test]
    fn non_option_rejects_null() {
        let err = String::from_value(Value::Null).unwrap_err();
        assert!(err.contains("unexpected NULL"));
    }

    #[test]
    fn display_is_diagnostic_friendly() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Text("abc".into()).to_string(), "abc");
        assert_eq!(Value::BigInt(10).to_string(), "10");
    }
}
