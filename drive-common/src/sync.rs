use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Result of one Sync Job invocation. `Skipped` is the idempotent no-op,
/// not an error.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "rows", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncOutcome {
    Skipped,
    Synced(u64),
}

/// The day a daily trigger at `now` should sync.
pub fn yesterday(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}
