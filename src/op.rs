//! Update requests accepted by the state engine.

use std::fmt;

use crate::{
    record::{Patch, Record},
    types::BoxError,
};

/// Function form of an update: derives a patch from the current record.
pub type UpdateFn = Box<dyn FnOnce(&Record) -> Result<Patch, BoxError> + Send>;

/// One update request.
pub enum Update {
    /// Apply this patch over the schema defaults.
    Set(Patch),
    /// Compute the patch from the current record, then apply it.
    With(UpdateFn),
}

impl Update {
    /// Wraps a literal patch.
    pub fn set(patch: Patch) -> Self {
        Self::Set(patch)
    }

    /// Wraps an infallible function of the current record.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&Record) -> Patch + Send + 'static,
    {
        Self::With(Box::new(move |old: &Record| -> Result<Patch, BoxError> {
            Ok(f(old))
        }))
    }

    /// Wraps a fallible function of the current record.
    pub fn try_with<F>(f: F) -> Self
    where
        F: FnOnce(&Record) -> Result<Patch, BoxError> + Send + 'static,
    {
        Self::With(Box::new(f))
    }

    /// Resolves the patch against `old`.
    pub fn resolve(self, old: &Record) -> Result<Patch, BoxError> {
        match self {
            Update::Set(patch) => Ok(patch),
            Update::With(f) => f(old),
        }
    }
}

impl From<Patch> for Update {
    fn from(patch: Patch) -> Self {
        Self::Set(patch)
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Set(patch) => f.debug_tuple("Set").field(patch).finish(),
            Update::With(_) => f.write_str("With(..)"),
        }
    }
}
