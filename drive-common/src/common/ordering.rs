use serde::{Deserialize, Serialize};

/// Result orderings the ledger queries support. Every ordering breaks
/// ties by insertion time, then run id, so pages are stable.
#[derive(Clone, Debug, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunOrdering {
    /// Priority ascending, then pipeline start time ascending (unstarted last).
    Priority,
    /// Extraction window start ascending.
    WindowStart,
}
