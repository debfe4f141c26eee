use async_graphql::{Context, Json, Object, Result as GqlResult};
use chrono::{NaiveDate, Utc};
use drive_common::{
    alert::max_accepted_time,
    capabilities::{ConnectionHealth, PipelineCapabilities, determine_capabilities},
    error::Error,
    event::EventLogRecord,
    run::{
        AuditResult, FinalCounts, NewRun, PipelineRun, PurgeDecision, RunFilter, Stage,
        StageUpdate,
    },
    state::{AlertDbTrait, BaseDbTrait, RunDbTrait, SyncDbTrait},
    sync::{SyncOutcome, yesterday},
};
use uuid::Uuid;

use super::error::{context_data, to_gql};

pub struct QueryRoot;
pub struct MutationRoot;

fn parse_stage(stage: &str) -> Result<Stage, Error> {
    stage
        .parse::<Stage>()
        .map_err(|_| Error::InvalidInput(format!("Unknown stage '{stage}'")))
}

#[Object]
impl QueryRoot {
    async fn run(&self, ctx: &Context<'_>, run_id: Uuid) -> GqlResult<Json<PipelineRun>> {
        let ctx = context_data(ctx)?;
        ctx.db.get_run(run_id).await.map(Json).map_err(to_gql)
    }

    async fn runs(
        &self,
        ctx: &Context<'_>,
        filter: Option<Json<RunFilter>>,
    ) -> GqlResult<Json<Vec<PipelineRun>>> {
        let ctx = context_data(ctx)?;
        let filter = filter.map(|f| f.0).unwrap_or_default();

        ctx.db.list_runs(&filter).await.map(Json).map_err(to_gql)
    }

    /// Runs with a failed step, or a step running longer than expected.
    async fn failing_or_stuck(
        &self,
        ctx: &Context<'_>,
        multiplier: Option<f64>,
    ) -> GqlResult<Json<Vec<PipelineRun>>> {
        let ctx = context_data(ctx)?;
        let multiplier = multiplier.unwrap_or(ctx.defaults.stuck_multiplier);

        ctx.db
            .failing_or_stuck(
                multiplier,
                ctx.defaults.default_pipeline_expected_secs,
                Utc::now(),
            )
            .await
            .map(Json)
            .map_err(to_gql)
    }

    async fn volume_anomalies(
        &self,
        ctx: &Context<'_>,
        factor: Option<f64>,
    ) -> GqlResult<Json<Vec<PipelineRun>>> {
        let ctx = context_data(ctx)?;
        let factor = factor.unwrap_or(ctx.defaults.volume_factor);

        ctx.db
            .volume_anomalies(factor)
            .await
            .map(Json)
            .map_err(to_gql)
    }

    async fn priority_ordered(&self, ctx: &Context<'_>) -> GqlResult<Json<Vec<PipelineRun>>> {
        let ctx = context_data(ctx)?;
        ctx.db.priority_ordered().await.map(Json).map_err(to_gql)
    }

    async fn stale_runs(
        &self,
        ctx: &Context<'_>,
        filter: Option<Json<RunFilter>>,
        threshold_factor: Option<f64>,
    ) -> GqlResult<Json<Vec<PipelineRun>>> {
        let ctx = context_data(ctx)?;
        let filter = filter.map(|f| f.0).unwrap_or_default();
        let threshold_factor = threshold_factor.unwrap_or(ctx.defaults.stale_threshold_factor);

        ctx.db
            .stale_runs(
                &filter,
                threshold_factor,
                ctx.defaults.default_pipeline_expected_secs,
                Utc::now(),
            )
            .await
            .map(Json)
            .map_err(to_gql)
    }

    /// Pending runs whose window is old enough to be picked up now.
    async fn ready_pending(
        &self,
        ctx: &Context<'_>,
        filter: Option<Json<RunFilter>>,
    ) -> GqlResult<Json<Vec<PipelineRun>>> {
        let ctx = context_data(ctx)?;
        let mut filter = filter.map(|f| f.0).unwrap_or_default();
        filter.limit = filter.limit.or(Some(ctx.defaults.max_records));

        let max_accepted = max_accepted_time(
            Utc::now(),
            ctx.defaults.x_time_back_secs,
            ctx.defaults.granularity_secs,
        );

        ctx.db
            .ready_pending(&filter, max_accepted)
            .await
            .map(Json)
            .map_err(to_gql)
    }

    async fn events(
        &self,
        ctx: &Context<'_>,
        run_id: Option<Uuid>,
        #[graphql(default = 100)] limit: u64,
    ) -> GqlResult<Json<Vec<EventLogRecord>>> {
        let ctx = context_data(ctx)?;
        ctx.db
            .list_events(run_id, limit)
            .await
            .map(Json)
            .map_err(to_gql)
    }

    /// Which transfers a run can perform given the reachable connections.
    async fn capabilities(
        &self,
        health: Json<ConnectionHealth>,
        dag_run_id: String,
    ) -> Json<PipelineCapabilities> {
        Json(determine_capabilities(&health, &dag_run_id))
    }
}

#[Object]
impl MutationRoot {
    async fn create_run(&self, ctx: &Context<'_>, input: Json<NewRun>) -> GqlResult<Uuid> {
        let ctx = context_data(ctx)?;
        ctx.db.create_run(input.0).await.map_err(to_gql)
    }

    async fn update_stage(
        &self,
        ctx: &Context<'_>,
        run_id: Uuid,
        stage: String,
        update: Json<StageUpdate>,
    ) -> GqlResult<bool> {
        let ctx = context_data(ctx)?;
        let stage = parse_stage(&stage).map_err(to_gql)?;

        ctx.db
            .update_stage(run_id, stage, update.0)
            .await
            .map(|_| true)
            .map_err(to_gql)
    }

    async fn finalize_run(
        &self,
        ctx: &Context<'_>,
        run_id: Uuid,
        counts: Option<Json<FinalCounts>>,
    ) -> GqlResult<Json<AuditResult>> {
        let ctx = context_data(ctx)?;
        let counts = counts.map(|c| c.0).unwrap_or_default();

        ctx.db
            .finalize_run(run_id, counts)
            .await
            .map(Json)
            .map_err(to_gql)
    }

    async fn reset_for_retry(
        &self,
        ctx: &Context<'_>,
        run_id: Uuid,
    ) -> GqlResult<Json<PipelineRun>> {
        let ctx = context_data(ctx)?;
        ctx.db.reset_for_retry(run_id).await.map(Json).map_err(to_gql)
    }

    async fn authorize_source_purge(
        &self,
        ctx: &Context<'_>,
        run_id: Uuid,
    ) -> GqlResult<Json<PurgeDecision>> {
        let ctx = context_data(ctx)?;
        ctx.db
            .authorize_source_purge(run_id)
            .await
            .map(Json)
            .map_err(to_gql)
    }

    /// Defaults to yesterday (UTC).
    async fn run_sync(
        &self,
        ctx: &Context<'_>,
        target_day: Option<NaiveDate>,
    ) -> GqlResult<Json<SyncOutcome>> {
        let ctx = context_data(ctx)?;
        let target_day = target_day.unwrap_or_else(|| yesterday(Utc::now()));

        ctx.db.run_sync(target_day).await.map(Json).map_err(to_gql)
    }
}
