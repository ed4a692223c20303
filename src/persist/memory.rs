//! Flat map held in process memory.

use crate::types::FlatMap;

use super::{FlatStore, ReadStore, StoreResult};

/// [`FlatStore`] keeping the last saved flat map.
///
/// ```
/// use flatstate::persist::{memory::MemoryStore, FlatStore, ReadStore};
/// use flatstate::types::FlatMap;
///
/// let mut store = MemoryStore::new();
/// let mut flat = FlatMap::new();
/// flat.insert("page".to_string(), Some("3".to_string()));
/// store.save(&flat).unwrap();
/// assert_eq!(store.get("page").unwrap().as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    current: FlatMap,
    saves: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `pairs`.
    pub fn with_entries<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            current: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
            saves: 0,
        }
    }

    /// Last saved flat map.
    pub fn snapshot(&self) -> &FlatMap {
        &self.current
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ReadStore for MemoryStore {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        Ok(self
            .current
            .get(field)
            .cloned()
            .flatten()
            .filter(|v| !v.is_empty()))
    }
}

impl FlatStore for MemoryStore {
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()> {
        self.current = flat.clone();
        self.saves += 1;
        Ok(())
    }
}
