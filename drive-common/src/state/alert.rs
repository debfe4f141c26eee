use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::Error,
    run::{PipelineRun, RunFilter},
};

use super::base::BaseDbTrait;

/// Read-only projections polled by dashboards and alerting.
#[async_trait]
pub trait AlertDbTrait: BaseDbTrait {
    /// Runs with a failed stage, or a stage (or the run) `IN_PROCESS`
    /// for longer than expected duration x `multiplier`
    /// ---
    /// A run without its own expected duration is measured against
    /// `default_expected_secs`; when that is `None` too it is never stuck.
    async fn failing_or_stuck(
        &self,
        multiplier: f64,
        default_expected_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PipelineRun>, Error>;

    /// Runs whose `source_count > avg_source_count x factor`
    async fn volume_anomalies(&self, factor: f64) -> Result<Vec<PipelineRun>, Error>;

    /// All runs, priority ascending, ties broken by start time
    async fn priority_ordered(&self) -> Result<Vec<PipelineRun>, Error>;

    /// In-process runs matching `filter` that overran expected duration
    /// x `threshold_factor` and can be safely re-executed
    /// ---
    /// `default_expected_secs` stands in for runs created without an
    /// expected duration. Truncated to `filter.limit`.
    async fn stale_runs(
        &self,
        filter: &RunFilter,
        threshold_factor: f64,
        default_expected_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PipelineRun>, Error>;

    /// Pending runs whose window start is at or before `max_accepted_time`
    /// ---
    /// Ordered by window start, truncated to `filter.limit`.
    async fn ready_pending(
        &self,
        filter: &RunFilter,
        max_accepted_time: DateTime<Utc>,
    ) -> Result<Vec<PipelineRun>, Error>;
}
