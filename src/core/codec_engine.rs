use crate::{
    persist::{FlatStore, ReadStore, StoreResult},
    record::Record,
    schema::{Schema, SchemaError},
    types::FlatMap,
};

use super::state::StateError;

/// Decodes every schema field from `store`.
///
/// Unparsable text never fails; only store errors do.
pub fn decode<S: ReadStore + ?Sized>(schema: &Schema, store: &S) -> StoreResult<Record> {
    let mut record = Record::new();
    for field in schema.fields() {
        let raw = store.get(field.name())?;
        record.insert(field.name(), field.codec().decode(raw.as_deref()));
    }
    Ok(record)
}

/// Encodes `record` into the flat wire form, one entry per schema field.
///
/// Absent or missing fields map to `None`; entries outside the schema are
/// ignored.
pub fn encode(schema: &Schema, record: &Record) -> Result<FlatMap, SchemaError> {
    let mut flat = FlatMap::new();
    for field in schema.fields() {
        let text = match record.value(field.name()) {
            Some(value) => Some(field.codec().encode(value).ok_or_else(|| {
                SchemaError::TypeMismatch {
                    field: field.name().to_string(),
                    expected: field.codec().kind(),
                    found: value.kind(),
                }
            })?),
            None => None,
        };
        flat.insert(field.name().to_string(), text);
    }
    Ok(flat)
}

/// Pure schema defaults, ignoring any store.
pub fn defaults(schema: &Schema) -> Record {
    schema
        .fields()
        .iter()
        .map(|field| (field.name(), field.codec().decode(None)))
        .collect()
}

/// Reads the structured value currently held by `store`.
pub fn read_persisted<S: ReadStore + ?Sized>(schema: &Schema, store: &S) -> StoreResult<Record> {
    decode(schema, store)
}

/// Writes `record` to `store` without going through a state engine.
pub fn persist<S: FlatStore + ?Sized>(
    schema: &Schema,
    record: &Record,
    store: &mut S,
) -> Result<(), StateError> {
    let flat = encode(schema, record)?;
    store.save(&flat)?;
    Ok(())
}

