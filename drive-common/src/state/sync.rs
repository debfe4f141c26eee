use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{error::Error, sync::SyncOutcome};

use super::base::BaseDbTrait;

#[async_trait]
pub trait SyncDbTrait: BaseDbTrait {
    /// Copies the day's successfully completed runs downstream, once
    /// ---
    /// Returns `Skipped` when the day was already synced.
    /// A concurrent invocation for the same day that loses the race
    /// fails with `AlreadySynced` instead of duplicating rows.
    async fn run_sync(&self, target_day: NaiveDate) -> Result<SyncOutcome, Error>;

    /// Number of downstream rows for `target_day`
    async fn synced_row_count(&self, target_day: NaiveDate) -> Result<u64, Error>;
}
