//! core::value
//!
//! Native attribute values.
//!
//! A [`Value`] is what callers read from and write to an entity. The
//! attribute store itself holds wire JSON; [`crate::core::codec`]
//! translates between the two representations.

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value as Json};

use super::types::{Embedded, FileRef, GeoPoint, Pointer, ToPointer};

/// Native representation of an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(Number),
    /// String scalar
    String(String),
    /// Point in time (wire tag `Date`)
    Date(DateTime<Utc>),
    /// Unresolved reference to another object (wire tag `Pointer`)
    Pointer(Pointer),
    /// Coordinate (wire tag `GeoPoint`)
    GeoPoint(GeoPoint),
    /// Stored file (wire tag `File`)
    File(FileRef),
    /// Inline object (wire tag `Object`)
    Object(Embedded),
    /// Unmaterialized relation to objects of `class_name` (wire tag `Relation`)
    Relation {
        /// Backend class name of the relation's members
        class_name: String,
    },
    /// Ordered sequence
    Array(Vec<Value>),
    /// Untagged map, passed through unchanged
    Map(Map<String, Json>),
}

impl Value {
    /// Whether this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of a numeric scalar.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Floating point view of a numeric scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Timestamp, if this is a date.
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Borrow the pointer, if this is a pointer.
    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Value::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow the items, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl ToPointer for Value {
    fn to_pointer(&self) -> Option<Pointer> {
        match self {
            Value::Pointer(p) => Some(p.clone()),
            Value::Object(embedded) => embedded.to_pointer(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Pointer> for Value {
    fn from(p: Pointer) -> Self {
        Value::Pointer(p)
    }
}

impl From<GeoPoint> for Value {
    fn from(g: GeoPoint) -> Self {
        Value::GeoPoint(g)
    }
}

impl From<FileRef> for Value {
    fn from(f: FileRef) -> Self {
        Value::File(f)
    }
}

impl From<Embedded> for Value {
    fn from(e: Embedded) -> Self {
        Value::Object(e)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a decoded [`Value`] into a typed field.
///
/// Used by the accessors that [`crate::model!`] generates. A value of
/// the wrong shape converts to `None` rather than failing.
pub trait FromValue: Sized {
    /// Convert, returning `None` when the value has another shape.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(d),
            Value::String(s) => super::codec::parse_date(&s),
            _ => None,
        }
    }
}

impl FromValue for Pointer {
    fn from_value(value: Value) -> Option<Self> {
        value.to_pointer()
    }
}

impl FromValue for GeoPoint {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::GeoPoint(g) => Some(g),
            _ => None,
        }
    }
}

impl FromValue for FileRef {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::File(f) => Some(f),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    /// Items that fail to convert are skipped.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items.into_iter().filter_map(T::from_value).collect()),
            _ => None,
        }
    }
}
