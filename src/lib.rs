//! Typed field codecs and a state engine that keeps a structured value in
//! sync with a flat string-keyed store.
//!
//! # Examples
//!
//! Decode, update, and persist against an in-memory store:
//! ```
//! use flatstate::{
//!     codec,
//!     core::state::PersistentState,
//!     persist::memory::MemoryStore,
//!     record::Patch,
//!     schema::Schema,
//! };
//!
//! let schema = Schema::builder()
//!     .field("page", codec::number().with_default(1.0))
//!     .field("tags", codec::string_array())
//!     .build()
//!     .expect("schema");
//!
//! let store = MemoryStore::with_entries([("page", "3")]);
//! let mut state = PersistentState::open(schema, store).expect("open");
//! assert_eq!(state.current().get::<f64>("page"), Some(3.0));
//!
//! state
//!     .set(Patch::new().set("tags", vec!["a".to_string(), "b".to_string()]))
//!     .expect("set");
//! // `page` was not part of the patch, so it fell back to its default.
//! assert_eq!(state.current().get::<f64>("page"), Some(1.0));
//! assert_eq!(state.store().snapshot()["page"].as_deref(), Some("1"));
//! ```
//!
//! Query string backed state hosted on the runtime:
//! ```no_run
//! use flatstate::{
//!     codec,
//!     core::state::PersistentState,
//!     persist::query::{MemoryHistory, QueryOptions, QueryStringStore},
//!     record::Patch,
//!     runtime::handle::{spawn_state, RuntimeConfig},
//!     schema::Schema,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let schema = Schema::builder()
//!     .field("q", codec::string())
//!     .build()
//!     .expect("schema");
//! let store = QueryStringStore::new(MemoryHistory::new("/search?lang=en"), QueryOptions::default());
//! let handle = spawn_state(PersistentState::open(schema, store).expect("open"), RuntimeConfig::default());
//! handle.set(Patch::new().set("q", "rust")).await.expect("set");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Field codecs.
pub mod codec;
/// Codec engine and persistent state engine.
pub mod core;
/// Update request model.
pub mod op;
/// Store adapter contract and backends.
pub mod persist;
/// Structured values and patches.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Field name -> codec mapping.
pub mod schema;
/// Shared value types.
pub mod types;
