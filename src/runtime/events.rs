//! Runtime event stream payloads.

use crate::types::Revision;

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// A new value was saved and committed.
    Committed {
        /// Revision of the committed value.
        revision: Revision,
    },
    /// The value was re-read from the store.
    Reloaded {
        /// Revision of the reloaded value.
        revision: Revision,
    },
    /// An update was rejected; the committed value is unchanged.
    UpdateFailed {
        /// Revision still in effect.
        revision: Revision,
    },
}
