use std::sync::Arc;

use thiserror::Error;

use crate::{
    op::Update,
    persist::{FlatStore, StoreError},
    record::{Patch, Record},
    schema::{Schema, SchemaError},
    types::{BoxError, Revision},
};

use super::{codec_engine::decode, merge::next_state};

/// Failures of a single state operation. The committed record is untouched.
#[derive(Debug, Error)]
pub enum StateError {
    /// The store failed to read or save.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A record value does not conform to the schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A function-form update returned an error.
    #[error("update function failed: {0}")]
    Update(#[source] BoxError),
}

/// Owns a structured value and keeps its store in sync.
///
/// Every committed value is shared as an immutable `Arc<Record>` and replaced
/// wholesale on each update.
///
/// ```
/// use flatstate::{
///     codec,
///     core::state::PersistentState,
///     persist::memory::MemoryStore,
///     record::Patch,
///     schema::Schema,
/// };
///
/// let schema = Schema::builder()
///     .field("page", codec::number().with_default(1.0))
///     .field("q", codec::string())
///     .build()
///     .unwrap();
///
/// let mut state = PersistentState::open(schema, MemoryStore::new()).unwrap();
/// state.set(Patch::new().set("page", 4.0)).unwrap();
/// state.update(|old| Patch::new().set("page", old.get::<f64>("page").unwrap() + 1.0)).unwrap();
///
/// assert_eq!(state.current().get::<f64>("page"), Some(5.0));
/// assert_eq!(state.current().get::<String>("q"), None);
/// ```
#[derive(Debug)]
pub struct PersistentState<S: FlatStore> {
    schema: Arc<Schema>,
    store: S,
    current: Arc<Record>,
    revision: Revision,
}

impl<S: FlatStore> PersistentState<S> {
    /// Decodes the initial value from `store`.
    pub fn open(schema: impl Into<Arc<Schema>>, store: S) -> Result<Self, StateError> {
        let schema = schema.into();
        let current = decode(&schema, &store)?;
        Ok(Self {
            schema,
            store,
            current: Arc::new(current),
            revision: 0,
        })
    }

    /// Schema this state was opened with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Shared handle to the schema.
    pub fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Field-name key of the schema.
    pub fn schema_id(&self) -> String {
        self.schema.id()
    }

    /// Currently committed value.
    pub fn current(&self) -> &Record {
        &self.current
    }

    /// Shared handle to the currently committed value.
    pub fn snapshot(&self) -> Arc<Record> {
        Arc::clone(&self.current)
    }

    /// Number of commits since open.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store. Call [`Self::reload`] after
    /// changing it behind the engine's back.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Releases the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Merges `update` over the defaults, saves it, then commits it.
    pub fn apply(&mut self, update: Update) -> Result<Arc<Record>, StateError> {
        let (merged, flat) = next_state(&self.schema, &self.current, update)?;
        self.store.save(&flat)?;
        Ok(self.commit(merged))
    }

    /// Applies updates in order; each sees the previous one's result.
    ///
    /// Stops at the first failure. Earlier updates stay committed.
    pub fn apply_all(
        &mut self,
        updates: impl IntoIterator<Item = Update>,
    ) -> Result<Arc<Record>, StateError> {
        for update in updates {
            self.apply(update)?;
        }
        Ok(self.snapshot())
    }

    /// Applies a literal patch.
    pub fn set(&mut self, patch: Patch) -> Result<Arc<Record>, StateError> {
        self.apply(Update::Set(patch))
    }

    /// Applies a patch computed from the current value.
    pub fn update<F>(&mut self, f: F) -> Result<Arc<Record>, StateError>
    where
        F: FnOnce(&Record) -> Patch + Send + 'static,
    {
        self.apply(Update::with(f))
    }

    /// Applies a fallible patch computed from the current value.
    pub fn try_update<F>(&mut self, f: F) -> Result<Arc<Record>, StateError>
    where
        F: FnOnce(&Record) -> Result<Patch, BoxError> + Send + 'static,
    {
        self.apply(Update::try_with(f))
    }

    /// Re-reads the store, e.g. after external navigation.
    pub fn reload(&mut self) -> Result<Arc<Record>, StateError> {
        let record = decode(&self.schema, &self.store)?;
        Ok(self.commit(record))
    }

    fn commit(&mut self, record: Record) -> Arc<Record> {
        self.current = Arc::new(record);
        self.revision += 1;
        Arc::clone(&self.current)
    }
}
