//! Schema codec engine and persistent state engine.

/// `decode`/`encode` across a schema and a store.
pub mod codec_engine;
/// Pure update transition.
pub mod merge;
/// Persistent state engine.
pub mod state;
