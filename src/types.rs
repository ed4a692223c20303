//! Shared field value model and flat wire map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Monotonic commit counter of a state instance.
pub type Revision = u64;

/// Wire form exchanged with a store: field name to serialized text.
///
/// `None` means "omit/delete this key".
pub type FlatMap = BTreeMap<String, Option<String>>;

/// Boxed error returned by fallible update functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Concrete value of one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Free text.
    String(String),
    /// Floating point number, `NaN` for unparsable input.
    Number(f64),
    /// Boolean flag.
    Boolean(bool),
    /// List of strings.
    StringArray(Vec<String>),
    /// List of numbers.
    NumberArray(Vec<f64>),
}

/// Discriminant of a [`Value`], used in type mismatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// [`Value::String`].
    String,
    /// [`Value::Number`].
    Number,
    /// [`Value::Boolean`].
    Boolean,
    /// [`Value::StringArray`].
    StringArray,
    /// [`Value::NumberArray`].
    NumberArray,
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::StringArray(_) => ValueKind::StringArray,
            Value::NumberArray(_) => ValueKind::NumberArray,
        }
    }
}

/// Rust types that can live in a schema field.
pub trait FieldValue: Clone + Sized {
    /// Kind of [`Value`] this type maps to.
    const KIND: ValueKind;

    /// Wraps `self` into a [`Value`].
    fn into_value(self) -> Value;

    /// Borrows the matching variant out of `value`, if the kinds agree.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Number;

    fn into_value(self) -> Value {
        Value::Number(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldValue for Vec<String> {
    const KIND: ValueKind = ValueKind::StringArray;

    fn into_value(self) -> Value {
        Value::StringArray(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FieldValue for Vec<f64> {
    const KIND: ValueKind = ValueKind::NumberArray;

    fn into_value(self) -> Value {
        Value::NumberArray(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::NumberArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StringArray(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::NumberArray(value)
    }
}
