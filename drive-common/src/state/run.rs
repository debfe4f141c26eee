use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Error,
    run::{
        AuditResult, FinalCounts, NewRun, PipelineRun, PurgeDecision, RunFilter, Stage,
        StageUpdate,
    },
};

use super::base::BaseDbTrait;

#[async_trait]
pub trait RunDbTrait: BaseDbTrait {
    //// --- READs --- ////

    /// Gets a run by `run_id`
    /// ---
    /// Fails with `NotFound` for an unknown id.
    async fn get_run(&self, run_id: Uuid) -> Result<PipelineRun, Error>;

    /// Lists runs matching `filter`
    /// ---
    /// Ordered by priority ascending, then pipeline start time.
    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<PipelineRun>, Error>;

    //// --- WRITEs --- ////

    /// Creates a new run when a pipeline execution starts
    /// ---
    /// Every stage starts `PENDING`, lineage ids are computed here,
    /// and `record_first_inserted_time` is set for good.
    /// A second run with the same (dag_run_id, thread id) is a `Conflict`.
    async fn create_run(&self, new_run: NewRun) -> Result<Uuid, Error>;

    /// Moves one stage forward
    /// ---
    /// Fails with `InvalidTransition` for disabled stages and backward moves,
    /// `InvalidTimestamps` when end precedes start, and `Conflict`
    /// when another write to the same run landed in between.
    async fn update_stage(
        &self,
        run_id: Uuid,
        stage: Stage,
        update: StageUpdate,
    ) -> Result<(), Error>;

    /// Finalizes a run
    /// ---
    /// Merges the reported counts, computes and stores the audit result,
    /// and sets the final pipeline status.
    async fn finalize_run(&self, run_id: Uuid, counts: FinalCounts)
    -> Result<AuditResult, Error>;

    /// Resets a stale or failed run for re-execution
    /// ---
    /// Completed stages are kept, everything else goes back to `PENDING`,
    /// `retry_attempt_number` is incremented.
    async fn reset_for_retry(&self, run_id: Uuid) -> Result<PipelineRun, Error>;

    /// Decides whether the run's source data may be purged
    /// ---
    /// Always `Refused` when historical data cannot be re-fetched.
    /// The decision is recorded in the event log.
    async fn authorize_source_purge(&self, run_id: Uuid) -> Result<PurgeDecision, Error>;
}
