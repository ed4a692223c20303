//! Flat-store adapter contract and concrete backends.

/// Key/value backends and the JSON record adapter.
pub mod kv;
/// In-memory flat store.
pub mod memory;
/// URL query string adapter.
pub mod query;
/// SQLite key/value backend.
pub mod sqlite;

use thiserror::Error;

use crate::types::FlatMap;

/// Failures raised by a store. The engine never swallows them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite backend failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// JSON encoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Any other backend failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of a flat store.
pub trait ReadStore {
    /// Raw serialized text for `field`, `None` when not stored.
    fn get(&self, field: &str) -> StoreResult<Option<String>>;
}

/// Read/write flat store consumed by the state engine.
pub trait FlatStore: ReadStore {
    /// Persists every field of `flat` at once; `None` entries are removed.
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()>;
}

/// Store that never holds anything; decoding against it yields defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct Defaults;

impl ReadStore for Defaults {
    fn get(&self, _field: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }
}

impl<S: ReadStore + ?Sized> ReadStore for &S {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        (**self).get(field)
    }
}

impl<S: ReadStore + ?Sized> ReadStore for &mut S {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        (**self).get(field)
    }
}

impl<S: FlatStore + ?Sized> FlatStore for &mut S {
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()> {
        (**self).save(flat)
    }
}

impl<S: ReadStore + ?Sized> ReadStore for Box<S> {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        (**self).get(field)
    }
}

impl<S: FlatStore + ?Sized> FlatStore for Box<S> {
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()> {
        (**self).save(flat)
    }
}
