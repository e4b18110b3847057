//! # Runtime Value Representation
//!
//! `Value<'a>` is the tagged union carried between plugin code and the page
//! codec: one variant per supported column type plus `Null`. The builder
//! stages owned values (`Value<'static>`); the reader hands back values that
//! borrow from the page's reference lists, using `Cow` so either side works
//! through the same type.
//!
//! | Variant | Rust type | Column type |
//! |---------|-----------|-------------|
//! | Null | - | any |
//! | Boolean | bool | boolean |
//! | Long | i64 | long |
//! | Double | f64 | double |
//! | String | Cow<str> | string |
//! | Json | Cow<serde_json::Value> | json |
//! | Timestamp | Timestamp | timestamp |
//!
//! Dispatching over a value is a single exhaustive match, so an unhandled
//! type is a compile error rather than a runtime fault.

use std::borrow::Cow;

use serde_json::Value as JsonValue;

use crate::types::{ColumnType, Timestamp};

#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(Cow<'a, str>),
    Json(Cow<'a, JsonValue>),
    Timestamp(Timestamp),
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column type this value belongs to, or `None` for `Null` (which
    /// is accepted by every column).
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Long(_) => Some(ColumnType::Long),
            Value::Double(_) => Some(ColumnType::Double),
            Value::String(_) => Some(ColumnType::String),
            Value::Json(_) => Some(ColumnType::Json),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Detaches the value from any borrowed page data.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(v) => Value::Boolean(v),
            Value::Long(v) => Value::Long(v),
            Value::Double(v) => Value::Double(v),
            Value::String(v) => Value::String(Cow::Owned(v.into_owned())),
            Value::Json(v) => Value::Json(Cow::Owned(v.into_owned())),
            Value::Timestamp(v) => Value::Timestamp(v),
        }
    }
}

impl From<bool> for Value<'static> {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value<'static> {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value<'static> {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value<'static> {
    fn from(v: String) -> Self {
        Value::String(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::String(Cow::Borrowed(v))
    }
}

impl From<JsonValue> for Value<'static> {
    fn from(v: JsonValue) -> Self {
        Value::Json(Cow::Owned(v))
    }
}

impl From<Timestamp> for Value<'static> {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}
