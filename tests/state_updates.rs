use std::sync::Arc;

use flatstate::{
    codec,
    core::{
        merge::next_state,
        state::{PersistentState, StateError},
    },
    op::Update,
    persist::{
        FlatStore, ReadStore, StoreError, StoreResult,
        memory::MemoryStore,
    },
    record::{Patch, Record},
    schema::{Schema, SchemaError},
    types::FlatMap,
};

fn counters() -> Schema {
    Schema::builder()
        .field("paramA", codec::number().with_default(0.0))
        .field("paramB", codec::number().with_default(0.0))
        .build()
        .expect("schema")
}

fn ab(a: f64, b: f64) -> Record {
    Record::new().with("paramA", a).with("paramB", b)
}

fn bump_both(old: &Record) -> Patch {
    Patch::new()
        .set("paramA", old.get::<f64>("paramA").unwrap_or_default() + 1.0)
        .set("paramB", old.get::<f64>("paramB").unwrap_or_default() + 1.0)
}

/// Memory store whose saves can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_saves: bool,
}

impl ReadStore for FlakyStore {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        self.inner.get(field)
    }
}

impl FlatStore for FlakyStore {
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()> {
        if self.fail_saves {
            return Err(StoreError::Message("disk full".to_string()));
        }
        self.inner.save(flat)
    }
}

#[test]
fn opens_with_schema_defaults() {
    let state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    assert_eq!(*state.current(), ab(0.0, 0.0));
    assert_eq!(state.revision(), 0);
    assert_eq!(state.schema_id(), "paramA,paramB");
}

#[test]
fn opens_from_existing_store_contents() {
    let store = MemoryStore::with_entries([("paramA", "42"), ("paramB", "")]);
    let state = PersistentState::open(counters(), store).expect("open");
    assert_eq!(*state.current(), ab(42.0, 0.0));
}

#[test]
fn full_update_replaces_state_and_persists() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(5.0, 7.0).to_patch()).expect("set");

    assert_eq!(*state.current(), ab(5.0, 7.0));
    let saved = state.store().snapshot();
    assert_eq!(saved["paramA"].as_deref(), Some("5"));
    assert_eq!(saved["paramB"].as_deref(), Some("7"));
}

#[test]
fn empty_patch_resets_to_defaults() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(5.0, 7.0).to_patch()).expect("set");

    state.set(Patch::new()).expect("reset");
    assert_eq!(*state.current(), ab(0.0, 0.0));
}

#[test]
fn partial_update_resets_unspecified_fields() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(5.0, 7.0).to_patch()).expect("set");

    state.set(Patch::new().set("paramB", 9.0)).expect("partial");
    assert_eq!(*state.current(), ab(0.0, 9.0));
}

#[test]
fn function_update_sees_previous_value() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(20.0, 30.0).to_patch()).expect("set");

    state
        .update(|old| {
            Patch::new()
                .set("paramA", old.get::<f64>("paramA").unwrap_or_default() + 10.0)
                .set("paramB", old.get::<f64>("paramB").unwrap_or_default() + 10.0)
        })
        .expect("update");
    assert_eq!(*state.current(), ab(30.0, 40.0));
}

#[test]
fn batched_function_updates_compose_in_order() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(10.0, 10.0).to_patch()).expect("set");

    let out = state
        .apply_all([
            Update::with(bump_both),
            Update::with(bump_both),
            Update::with(bump_both),
        ])
        .expect("batch");

    assert_eq!(*out, ab(13.0, 13.0));
    assert_eq!(state.revision(), 4);
    assert_eq!(state.store().save_count(), 4);
}

#[test]
fn batched_partial_updates_reset_omitted_fields_each_step() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(10.0, 10.0).to_patch()).expect("set");

    let bump_a = |old: &Record| {
        Patch::new().set("paramA", old.get::<f64>("paramA").unwrap_or_default() + 2.0)
    };
    state
        .apply_all([
            Update::with(bump_a),
            Update::with(bump_a),
            Update::with(|old: &Record| {
                Patch::new()
                    .set("paramA", old.get::<f64>("paramA").unwrap_or_default() + 2.0)
                    .set("paramB", old.get::<f64>("paramB").unwrap_or_default() + 3.0)
            }),
        ])
        .expect("batch");

    assert_eq!(*state.current(), ab(16.0, 3.0));
}

#[test]
fn explicit_absent_overrides_default() {
    let schema = Schema::builder()
        .field("q", codec::string().with_default("all"))
        .field("page", codec::number())
        .build()
        .expect("schema");
    let mut state = PersistentState::open(schema, MemoryStore::new()).expect("open");
    assert_eq!(state.current().get::<String>("q").as_deref(), Some("all"));

    state
        .set(Patch::new().clear("q").set("page", 2.0))
        .expect("set");
    assert_eq!(state.current().value("q"), None);
    assert_eq!(state.store().snapshot()["q"], None);
    assert_eq!(state.store().snapshot()["page"].as_deref(), Some("2"));
}

#[test]
fn unknown_patch_fields_are_dropped() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state
        .set(Patch::new().set("paramA", 1.0).set("other", "x"))
        .expect("set");

    assert!(!state.current().contains("other"));
    assert!(!state.store().snapshot().contains_key("other"));
}

#[test]
fn failing_update_function_leaves_state_untouched() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    state.set(ab(1.0, 2.0).to_patch()).expect("set");

    let err = state
        .try_update(|_| Err("rejected".into()))
        .unwrap_err();
    assert!(matches!(err, StateError::Update(_)));
    assert_eq!(err.to_string(), "update function failed: rejected");
    assert_eq!(*state.current(), ab(1.0, 2.0));
    assert_eq!(state.revision(), 1);
    assert_eq!(state.store().save_count(), 1);
}

#[test]
fn failing_save_rolls_back_in_memory_value_only() {
    let mut state = PersistentState::open(counters(), FlakyStore::default()).expect("open");
    state.set(ab(1.0, 2.0).to_patch()).expect("set");

    state.store_mut().fail_saves = true;
    let err = state.set(ab(8.0, 9.0).to_patch()).unwrap_err();
    assert!(matches!(err, StateError::Store(StoreError::Message(_))));
    assert_eq!(*state.current(), ab(1.0, 2.0));
    assert_eq!(state.store().inner.snapshot()["paramA"].as_deref(), Some("1"));
}

#[test]
fn apply_all_stops_at_first_failure() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");

    let err = state
        .apply_all([
            Update::with(bump_both),
            Update::try_with(|_| Err("boom".into())),
            Update::with(bump_both),
        ])
        .unwrap_err();

    assert!(matches!(err, StateError::Update(_)));
    assert_eq!(*state.current(), ab(1.0, 1.0));
    assert_eq!(state.revision(), 1);
}

#[test]
fn type_mismatch_is_reported_before_saving() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    let err = state.set(Patch::new().set("paramA", true)).unwrap_err();

    assert!(matches!(
        err,
        StateError::Schema(SchemaError::TypeMismatch { .. })
    ));
    assert_eq!(state.store().save_count(), 0);
    assert_eq!(*state.current(), ab(0.0, 0.0));
}

#[test]
fn snapshots_are_never_mutated() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");
    let before = state.snapshot();

    let after = state.set(ab(3.0, 4.0).to_patch()).expect("set");
    assert_eq!(*before, ab(0.0, 0.0));
    assert_eq!(*after, ab(3.0, 4.0));
    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn reload_picks_up_external_store_changes() {
    let mut state = PersistentState::open(counters(), MemoryStore::new()).expect("open");

    let mut flat = FlatMap::new();
    flat.insert("paramA".to_string(), Some("11".to_string()));
    state.store_mut().save(&flat).expect("external write");

    let reloaded = state.reload().expect("reload");
    assert_eq!(*reloaded, ab(11.0, 0.0));
}

#[test]
fn next_state_is_pure() {
    let schema = counters();
    let old = ab(4.0, 4.0);

    let (merged, flat) = next_state(&schema, &old, Update::with(bump_both)).expect("transition");
    assert_eq!(merged, ab(5.0, 5.0));
    assert_eq!(flat["paramA"].as_deref(), Some("5"));
    assert_eq!(old, ab(4.0, 4.0));
}
