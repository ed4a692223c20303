use crate::{
    op::Update,
    record::{Patch, Record},
    schema::Schema,
    types::FlatMap,
};

use super::{
    codec_engine::{defaults, encode},
    state::StateError,
};

/// Overlays `patch` on the schema defaults.
///
/// Fields the patch omits reset to their default; fields it sets to `None`
/// become absent. Fields outside the schema are dropped.
pub fn merge(schema: &Schema, patch: Patch) -> Record {
    let mut merged = defaults(schema);
    for (field, value) in patch.into_entries() {
        if schema.contains(&field) {
            merged.insert(field, value);
        }
    }
    merged
}

/// State transition `(old, update) -> (new, wire form)`.
///
/// Does not touch any store; nothing is committed on error.
pub fn next_state(
    schema: &Schema,
    old: &Record,
    update: Update,
) -> Result<(Record, FlatMap), StateError> {
    let partial = update.resolve(old).map_err(StateError::Update)?;
    let merged = merge(schema, partial);
    let flat = encode(schema, &merged)?;
    Ok((merged, flat))
}
