//! Ordered field name -> codec mapping.

use std::sync::Arc;

use hashbrown::HashMap;
use thiserror::Error;

use crate::{
    codec::FieldCodec,
    types::ValueKind,
};

/// Schema construction and conformance errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The same field name was declared twice.
    #[error("duplicate field `{0}`")]
    DuplicateField(String),
    /// A record value does not match its field's codec.
    #[error("field `{field}` expects {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Offending field.
        field: String,
        /// Kind accepted by the field's codec.
        expected: ValueKind,
        /// Kind found in the record.
        found: ValueKind,
    },
}

/// One named field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    codec: Arc<dyn FieldCodec>,
}

impl Field {
    /// Field name, also the store key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Codec for this field.
    pub fn codec(&self) -> &dyn FieldCodec {
        self.codec.as_ref()
    }
}

/// Immutable shape of a structured value.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    pos: HashMap<String, usize>,
}

impl Schema {
    /// Starts an empty builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.pos.get(name).map(|idx| &self.fields[*idx])
    }

    /// True when `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.pos.contains_key(name)
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Comma-joined field names; identifies the schema shape.
    pub fn id(&self) -> String {
        self.names().collect::<Vec<_>>().join(",")
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Declares a field backed by `codec`.
    pub fn field(mut self, name: impl Into<String>, codec: impl FieldCodec + 'static) -> Self {
        self.fields.push(Field {
            name: name.into(),
            codec: Arc::new(codec),
        });
        self
    }

    /// Validates names and freezes the schema.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut pos = HashMap::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if pos.insert(field.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Schema {
            fields: self.fields,
            pos,
        })
    }
}
