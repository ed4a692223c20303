//! Structured values and sparse patches.

use hashbrown::HashMap;

use crate::types::{FieldValue, Value};

/// Decoded structured value: one optional entry per schema field.
///
/// `None` is the absent marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: HashMap<String, Option<Value>>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::insert`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    /// Builder form of inserting an absent entry.
    pub fn with_absent(mut self, field: impl Into<String>) -> Self {
        self.insert(field, None);
        self
    }

    /// Sets `field` to `value`, replacing any prior entry.
    pub fn insert(&mut self, field: impl Into<String>, value: Option<Value>) {
        self.values.insert(field.into(), value);
    }

    /// Raw field value; `None` when absent or undeclared.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field).and_then(Option::as_ref)
    }

    /// Typed field value; `None` when absent or of another kind.
    pub fn get<T: FieldValue>(&self, field: &str) -> Option<T> {
        self.value(field).and_then(T::from_value)
    }

    /// True when the record carries an entry for `field`, absent or not.
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Iterates over every entry.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Full patch reproducing this record on update.
    pub fn to_patch(&self) -> Patch {
        Patch {
            values: self.values.clone(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Sparse update: fields it names override, fields it omits reset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    values: HashMap<String, Option<Value>>,
}

impl Patch {
    /// Creates an empty patch, which resets every field on update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides `field` with `value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), Some(value.into()));
        self
    }

    /// Overrides `field` with the absent marker.
    pub fn clear(mut self, field: impl Into<String>) -> Self {
        self.values.insert(field.into(), None);
        self
    }

    /// Overrides `field` with `value` when `Some`, else clears it.
    pub fn set_opt<T: FieldValue>(mut self, field: impl Into<String>, value: Option<T>) -> Self {
        self.values
            .insert(field.into(), value.map(FieldValue::into_value));
        self
    }

    /// Override for `field`: outer `None` when the patch omits it.
    pub fn get(&self, field: &str) -> Option<Option<&Value>> {
        self.values.get(field).map(Option::as_ref)
    }

    /// Iterates over every override.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// True when the patch names no field.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, Option<Value>)> {
        self.values.into_iter()
    }
}

impl From<Record> for Patch {
    fn from(record: Record) -> Self {
        Patch {
            values: record.values,
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for Patch {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
