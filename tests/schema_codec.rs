use proptest::prelude::*;

use flatstate::{
    codec,
    core::codec_engine::{decode, defaults, encode, persist, read_persisted},
    persist::{Defaults, memory::MemoryStore},
    record::Record,
    schema::{Schema, SchemaError},
    types::{Value, ValueKind},
};

fn filters_schema() -> Schema {
    Schema::builder()
        .field("query", codec::string())
        .field("page", codec::number().with_default(1.0))
        .field("archived", codec::boolean().with_default(false))
        .field("tags", codec::string_array())
        .field("ids", codec::number_array())
        .build()
        .expect("schema")
}

#[test]
fn duplicate_field_names_are_rejected() {
    let err = Schema::builder()
        .field("a", codec::string())
        .field("a", codec::number())
        .build()
        .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateField("a".to_string()));
}

#[test]
fn schema_id_joins_names_in_declaration_order() {
    let schema = filters_schema();
    assert_eq!(schema.id(), "query,page,archived,tags,ids");
    assert_eq!(schema.len(), 5);
    assert!(schema.contains("tags"));
    assert!(!schema.contains("missing"));
    assert_eq!(schema.field("page").map(|f| f.codec().kind()), Some(ValueKind::Number));
    assert!(schema.field("page").is_some_and(|f| f.codec().has_default()));
}

#[test]
fn decode_reads_each_field_independently() {
    let schema = filters_schema();
    let store = MemoryStore::with_entries([("page", "oops"), ("archived", "true"), ("ids", "4,5")]);

    let record = decode(&schema, &store).expect("decode");
    assert!(record.get::<f64>("page").is_some_and(f64::is_nan));
    assert_eq!(record.get::<bool>("archived"), Some(true));
    assert_eq!(record.get::<Vec<f64>>("ids"), Some(vec![4.0, 5.0]));
    assert_eq!(record.value("query"), None);
    assert!(record.contains("query"));
    assert_eq!(record.len(), 5);
}

#[test]
fn defaults_match_decoding_an_empty_store() {
    let schema = filters_schema();
    let from_defaults = decode(&schema, &Defaults).expect("decode");
    assert_eq!(from_defaults, defaults(&schema));
    assert_eq!(
        from_defaults,
        Record::new()
            .with_absent("query")
            .with("page", 1.0)
            .with("archived", false)
            .with_absent("tags")
            .with_absent("ids")
    );
}

#[test]
fn encode_emits_every_schema_field_and_ignores_extras() {
    let schema = filters_schema();
    let record = Record::new()
        .with("query", "rust")
        .with("page", 2.0)
        .with("unknown", "ignored");

    let flat = encode(&schema, &record).expect("encode");
    assert_eq!(flat.len(), 5);
    assert_eq!(flat["query"].as_deref(), Some("rust"));
    assert_eq!(flat["page"].as_deref(), Some("2"));
    assert_eq!(flat["archived"], None);
    assert!(!flat.contains_key("unknown"));
}

#[test]
fn encode_rejects_values_of_the_wrong_kind() {
    let schema = filters_schema();
    let record = Record::new().with("page", "two");

    let err = encode(&schema, &record).unwrap_err();
    assert_eq!(
        err,
        SchemaError::TypeMismatch {
            field: "page".to_string(),
            expected: ValueKind::Number,
            found: ValueKind::String,
        }
    );
}

#[test]
fn persist_then_read_persisted() {
    let schema = filters_schema();
    let mut store = MemoryStore::new();
    let record = Record::new()
        .with("query", "a b")
        .with("page", 3.0)
        .with("archived", true)
        .with("tags", vec!["x".to_string(), "y".to_string()])
        .with_absent("ids");

    persist(&schema, &record, &mut store).expect("persist");
    assert_eq!(store.save_count(), 1);
    assert_eq!(read_persisted(&schema, &store).expect("read"), record);
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::option::of("[a-zA-Z0-9 ]{1,12}"),
        prop::option::of(-1.0e6f64..1.0e6),
        prop::option::of(any::<bool>()),
        prop::option::of(prop::collection::vec("[a-z]{1,6}", 1..4)),
        prop::option::of(prop::collection::vec(-1000i32..1000, 1..4)),
    )
        .prop_map(|(query, page, archived, tags, ids)| {
            Record::from_iter([
                ("query", query.map(Value::from)),
                ("page", Some(Value::from(page.unwrap_or(1.0)))),
                ("archived", Some(Value::from(archived.unwrap_or(false)))),
                ("tags", tags.map(Value::from)),
                (
                    "ids",
                    ids.map(|ids| Value::from(ids.into_iter().map(f64::from).collect::<Vec<_>>())),
                ),
            ])
        })
}

proptest! {
    #[test]
    fn decode_inverts_encode(record in record_strategy()) {
        let schema = filters_schema();
        let mut store = MemoryStore::new();
        persist(&schema, &record, &mut store).expect("persist");
        prop_assert_eq!(decode(&schema, &store).expect("decode"), record);
    }
}
