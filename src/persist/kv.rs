//! Key/value backends and the adapter storing a whole flat map under one key.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::FlatMap;

use super::{FlatStore, ReadStore, StoreResult};

/// Persistent string key/value storage.
pub trait KeyValueStore {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    /// Stores `value` under `key`, replacing any prior value.
    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`. Missing keys are not an error.
    fn remove_item(&mut self, key: &str) -> StoreResult<()>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    items: HashMap<String, String>,
}

impl MemoryKv {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Options for [`JsonRecordStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRecordOptions {
    /// Key under which the JSON record lives.
    pub key: String,
}

impl Default for JsonRecordOptions {
    fn default() -> Self {
        Self {
            key: "flatstate".to_string(),
        }
    }
}

/// [`FlatStore`] writing the flat map as one JSON object under a single key.
///
/// The decoded record is cached and refreshed on every save.
#[derive(Debug)]
pub struct JsonRecordStore<K: KeyValueStore> {
    backend: K,
    options: JsonRecordOptions,
    parsed: HashMap<String, String>,
}

impl<K: KeyValueStore> JsonRecordStore<K> {
    /// Loads the record stored under `options.key`.
    ///
    /// A missing or corrupt record starts out empty.
    pub fn open(backend: K, options: JsonRecordOptions) -> StoreResult<Self> {
        let raw = backend.get_item(&options.key)?;
        let parsed = raw
            .as_deref()
            .map(|raw| parse_record(&options.key, raw))
            .unwrap_or_default();
        Ok(Self {
            backend,
            options,
            parsed,
        })
    }

    /// Key under which the record lives.
    pub fn key(&self) -> &str {
        &self.options.key
    }

    /// Backing key/value store.
    pub fn backend(&self) -> &K {
        &self.backend
    }

    /// Releases the backing key/value store.
    pub fn into_backend(self) -> K {
        self.backend
    }

    /// Deletes the record from the backend and clears the cache.
    pub fn clear(&mut self) -> StoreResult<()> {
        self.backend.remove_item(&self.options.key)?;
        self.parsed.clear();
        Ok(())
    }
}

impl<K: KeyValueStore> ReadStore for JsonRecordStore<K> {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        Ok(self.parsed.get(field).filter(|v| !v.is_empty()).cloned())
    }
}

impl<K: KeyValueStore> FlatStore for JsonRecordStore<K> {
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()> {
        let present: BTreeMap<&str, &str> = flat
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect();
        let payload = serde_json::to_string(&present)?;
        self.backend.set_item(&self.options.key, &payload)?;
        tracing::trace!(key = %self.options.key, fields = present.len(), "json record saved");

        self.parsed = present
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(())
    }
}

fn parse_record(key: &str, raw: &str) -> HashMap<String, String> {
    let object = match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        Ok(object) => object,
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable json record");
            return HashMap::new();
        }
    };

    object
        .into_iter()
        .filter_map(|(field, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((field, text))
        })
        .collect()
}
