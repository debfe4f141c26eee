use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drive_common::{
    alert::{is_failing_or_stuck, is_stale, is_volume_anomaly, validate_factor},
    common::RunOrdering,
    error::Error,
    run::{PipelineRun, ProgressStatus, RunFilter},
    state::AlertDbTrait,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

use crate::{
    db::LedgerStateDb,
    entities::drive_table,
    mapping::{db_error_to_domain, drive_row_to_domain, to_db},
    query::{filter_condition, limited, ordered},
};

impl LedgerStateDb {
    async fn fetch_runs(&self, query: Select<drive_table::Entity>) -> Result<Vec<PipelineRun>, Error> {
        query
            .all(&self.conn)
            .await
            .map_err(db_error_to_domain)?
            .into_iter()
            .map(drive_row_to_domain)
            .collect()
    }
}

fn status_eq(status: ProgressStatus) -> sea_orm::sea_query::SimpleExpr {
    drive_table::Column::PipelineStatus.eq(status.to_string())
}

fn re_executable() -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(drive_table::Column::ContinuityCheckPerformed.eq(true))
        .add(drive_table::Column::CanFetchHistoricalData.eq(true))
}

#[async_trait]
impl AlertDbTrait for LedgerStateDb {
    async fn failing_or_stuck(
        &self,
        multiplier: f64,
        default_expected_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PipelineRun>, Error> {
        validate_factor("multiplier", multiplier)?;

        // a completed run has no failed or running stages left
        let query = drive_table::Entity::find()
            .filter(drive_table::Column::PipelineStatus.ne(ProgressStatus::Completed.to_string()));

        let runs = self
            .fetch_runs(ordered(query, RunOrdering::Priority))
            .await?
            .into_iter()
            .filter(|run| is_failing_or_stuck(run, multiplier, default_expected_secs, now))
            .collect();

        Ok(runs)
    }

    async fn volume_anomalies(&self, factor: f64) -> Result<Vec<PipelineRun>, Error> {
        validate_factor("factor", factor)?;

        let query = drive_table::Entity::find()
            .filter(drive_table::Column::SourceCount.is_not_null())
            .filter(drive_table::Column::AvgSourceCount.is_not_null());

        let runs = self
            .fetch_runs(ordered(query, RunOrdering::Priority))
            .await?
            .into_iter()
            .filter(|run| is_volume_anomaly(run, factor))
            .collect();

        Ok(runs)
    }

    async fn priority_ordered(&self) -> Result<Vec<PipelineRun>, Error> {
        self.fetch_runs(ordered(drive_table::Entity::find(), RunOrdering::Priority))
            .await
    }

    async fn stale_runs(
        &self,
        filter: &RunFilter,
        threshold_factor: f64,
        default_expected_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PipelineRun>, Error> {
        validate_factor("threshold_factor", threshold_factor)?;

        let query = drive_table::Entity::find()
            .filter(filter_condition(filter))
            .filter(status_eq(ProgressStatus::InProcess))
            .filter(re_executable());

        // elapsed time is judged in memory, so the limit applies afterwards
        let stale = self
            .fetch_runs(ordered(query, RunOrdering::Priority))
            .await?
            .into_iter()
            .filter(|run| is_stale(run, threshold_factor, default_expected_secs, now));

        let runs = match filter.limit {
            Some(limit) => stale
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => stale.collect(),
        };

        Ok(runs)
    }

    async fn ready_pending(
        &self,
        filter: &RunFilter,
        max_accepted_time: DateTime<Utc>,
    ) -> Result<Vec<PipelineRun>, Error> {
        let query = drive_table::Entity::find()
            .filter(filter_condition(filter))
            .filter(status_eq(ProgressStatus::Pending))
            .filter(re_executable())
            .filter(drive_table::Column::QueryWindowStartTime.lte(to_db(max_accepted_time)));

        self.fetch_runs(limited(ordered(query, RunOrdering::WindowStart), filter.limit))
            .await
    }
}
