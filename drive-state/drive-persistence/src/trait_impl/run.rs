use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drive_common::{
    common::RunOrdering,
    error::Error,
    event::{EventSeverity, EventType},
    run::{
        AuditResult, FinalCounts, NewRun, PipelineRun, PurgeDecision, RunFilter, Stage,
        StageUpdate,
    },
    state::RunDbTrait,
};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, TransactionTrait,
};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    db::{LedgerStateDb, now},
    entities::drive_table,
    event_logging::{log_event_direct, log_event_in_txn},
    mapping::{db_error_to_domain, domain_run_to_db, drive_row_to_domain, unique_violation_or},
    query::{filter_condition, limited, ordered},
};

/// Writes `run` back over the row it was read from.
/// ---
/// The update only lands if the stored revision still equals
/// `read_revision`; anything else means another writer got there first.
pub(crate) async fn write_run<C: ConnectionTrait>(
    conn: &C,
    run: &PipelineRun,
    read_revision: i64,
) -> Result<(), Error> {
    let mut active_model = domain_run_to_db(run);
    active_model.run_id = NotSet;
    active_model.record_first_inserted_time = NotSet;

    let res = drive_table::Entity::update_many()
        .set(active_model)
        .filter(drive_table::Column::RunId.eq(run.id))
        .filter(drive_table::Column::Revision.eq(read_revision))
        .exec(conn)
        .await
        .map_err(db_error_to_domain)?;

    if res.rows_affected == 0 {
        return Err(Error::Conflict(format!(
            "Run {} was modified concurrently (expected revision {read_revision})",
            run.id
        )));
    }

    Ok(())
}

async fn load_run(txn: &DatabaseTransaction, run_id: Uuid) -> Result<PipelineRun, Error> {
    let model = drive_table::Entity::find_by_id(run_id)
        .one(txn)
        .await
        .map_err(db_error_to_domain)?
        .ok_or_else(|| Error::run_not_found(run_id))?;

    drive_row_to_domain(model)
}

impl LedgerStateDb {
    /// Read, change and write back a single run inside one transaction,
    /// logging `event_type` alongside the write.
    async fn mutate_run<T, F, D>(
        &self,
        run_id: Uuid,
        event_type: EventType,
        mutate: F,
        describe: D,
    ) -> Result<(T, PipelineRun), Error>
    where
        T: Send,
        F: FnOnce(&mut PipelineRun, DateTime<Utc>) -> Result<T, Error> + Send,
        D: FnOnce(&T, &PipelineRun) -> serde_json::Value + Send,
    {
        let txn = self.conn.begin().await.map_err(db_error_to_domain)?;

        let result = async {
            let mut run = load_run(&txn, run_id).await?;
            let read_revision = run.revision;

            let out = mutate(&mut run, now())?;
            run.revision = read_revision + 1;

            write_run(&txn, &run, read_revision).await?;

            log_event_in_txn(
                &txn,
                Some(run_id),
                event_type,
                Some(format!("{event_type} for run {run_id}")),
                Some(describe(&out, &run)),
            )
            .await
            .map_err(db_error_to_domain)?;

            Ok::<_, Error>((out, run))
        }
        .await;

        match result {
            Ok(done) => {
                txn.commit().await.map_err(db_error_to_domain)?;
                Ok(done)
            }
            Err(err) => {
                txn.rollback().await.map_err(db_error_to_domain)?;

                warn!(run_id = %run_id, action = %event_type, error = %err, "Run update rejected");

                // unknown runs have nothing to attach a failure to
                if !matches!(err, Error::NotFound { .. }) {
                    let severity = match err {
                        Error::Database(_) | Error::Internal(_) => EventSeverity::Error,
                        _ => EventSeverity::Warn,
                    };

                    log_event_direct(
                        &self.conn,
                        Some(run_id),
                        EventType::RunUpdateFailed,
                        severity,
                        Some(format!("{event_type} failed for run {run_id}: {err}")),
                        Some(json!({ "action": event_type.to_string(), "code": err.code() })),
                    )
                    .await?;
                }

                Err(err)
            }
        }
    }
}

#[async_trait]
impl RunDbTrait for LedgerStateDb {
    async fn get_run(&self, run_id: Uuid) -> Result<PipelineRun, Error> {
        let model = drive_table::Entity::find_by_id(run_id)
            .one(&self.conn)
            .await
            .map_err(db_error_to_domain)?
            .ok_or_else(|| Error::run_not_found(run_id))?;

        drive_row_to_domain(model)
    }

    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<PipelineRun>, Error> {
        let query = drive_table::Entity::find().filter(filter_condition(filter));

        limited(ordered(query, RunOrdering::Priority), filter.limit)
            .all(&self.conn)
            .await
            .map_err(db_error_to_domain)?
            .into_iter()
            .map(drive_row_to_domain)
            .collect()
    }

    async fn create_run(&self, new_run: NewRun) -> Result<Uuid, Error> {
        let run_id = Uuid::new_v4();
        let run = new_run.into_run(run_id, now())?;

        let txn = self.conn.begin().await.map_err(db_error_to_domain)?;

        let insert_res = drive_table::Entity::insert(domain_run_to_db(&run))
            .exec_without_returning(&txn)
            .await;

        if let Err(db_err) = insert_res {
            txn.rollback().await.map_err(db_error_to_domain)?;

            let err = unique_violation_or(db_err, |_| {
                Error::Conflict(format!(
                    "A run for dag_run_id '{}' thread {} already exists",
                    run.dag_run_id, run.pipeline_parallel_thread_id
                ))
            });

            log_event_direct(
                &self.conn,
                None,
                EventType::RunUpdateFailed,
                EventSeverity::Warn,
                Some(format!("Failed run creation: insert drive_table failed: {err}")),
                Some(json!({
                    "dag_run_id": run.dag_run_id,
                    "pipeline_parallel_thread_id": run.pipeline_parallel_thread_id,
                })),
            )
            .await?;

            return Err(err);
        }

        let metadata = json!({
            "pipeline_name": run.pipeline_name,
            "dag_run_id": run.dag_run_id,
            "pipeline_parallel_thread_id": run.pipeline_parallel_thread_id,
            "pipeline_id": run.lineage.pipeline_id,
            "target_day": run.window.target_day,
        });

        if let Err(db_err) = log_event_in_txn(
            &txn,
            Some(run_id),
            EventType::RunCreated,
            Some(format!("Created run {run_id} for {}", run.pipeline_name)),
            Some(metadata),
        )
        .await
        {
            txn.rollback().await.map_err(db_error_to_domain)?;
            return Err(db_error_to_domain(db_err));
        }

        txn.commit().await.map_err(db_error_to_domain)?;

        info!(
            run_id = %run_id,
            pipeline_name = %run.pipeline_name,
            dag_run_id = %run.dag_run_id,
            "Pipeline run created"
        );

        Ok(run_id)
    }

    async fn update_stage(
        &self,
        run_id: Uuid,
        stage: Stage,
        update: StageUpdate,
    ) -> Result<(), Error> {
        let (_, run) = self
            .mutate_run(
                run_id,
                EventType::StageUpdated,
                |run, now| run.apply_stage_update(stage, &update, now),
                |_, run| {
                    json!({
                        "stage": stage.to_string(),
                        "status": run.stages.get(stage).status.to_string(),
                        "revision": run.revision,
                    })
                },
            )
            .await?;

        debug!(
            run_id = %run_id,
            stage = %stage,
            status = %run.stages.get(stage).status,
            "Stage updated"
        );

        Ok(())
    }

    async fn finalize_run(
        &self,
        run_id: Uuid,
        counts: FinalCounts,
    ) -> Result<AuditResult, Error> {
        let (audit_result, run) = self
            .mutate_run(
                run_id,
                EventType::RunFinalized,
                |run, now| run.finalize(&counts, now),
                |audit_result, run| {
                    json!({
                        "audit_result": audit_result.to_string(),
                        "pipeline_status": run.pipeline_status.to_string(),
                        "source_count": run.counts.source_count,
                        "stage_count": run.counts.stage_count,
                        "target_count": run.counts.target_count,
                    })
                },
            )
            .await?;

        info!(
            run_id = %run_id,
            pipeline_status = %run.pipeline_status,
            audit_result = %audit_result,
            "Pipeline run finalized"
        );

        if audit_result == AuditResult::Mismatched {
            warn!(
                run_id = %run_id,
                can_fetch_historical_data = run.flags.can_fetch_historical_data,
                "Audit mismatch detected"
            );
        }

        Ok(audit_result)
    }

    async fn reset_for_retry(&self, run_id: Uuid) -> Result<PipelineRun, Error> {
        let (_, run) = self
            .mutate_run(
                run_id,
                EventType::RunResetForRetry,
                |run, now| run.reset_for_retry(now),
                |_, run| json!({ "retry_attempt_number": run.retry_attempt_number }),
            )
            .await?;

        info!(
            run_id = %run_id,
            retry_attempt_number = run.retry_attempt_number,
            "Pipeline run reset to PENDING"
        );

        Ok(run)
    }

    async fn authorize_source_purge(&self, run_id: Uuid) -> Result<PurgeDecision, Error> {
        let run = self.get_run(run_id).await?;
        let decision = run.purge_decision();

        let (event_type, message) = match &decision {
            PurgeDecision::Allowed => (
                EventType::SourcePurgeAllowed,
                format!("Source purge allowed for run {run_id}"),
            ),
            PurgeDecision::Refused { reason } => {
                warn!(run_id = %run_id, reason = %reason, "Source purge refused");
                (
                    EventType::SourcePurgeRefused,
                    format!("Source purge refused for run {run_id}: {reason}"),
                )
            }
        };

        log_event_direct(
            &self.conn,
            Some(run_id),
            event_type,
            EventSeverity::from(event_type),
            Some(message),
            Some(json!({
                "audit_result": run.audit_result.to_string(),
                "can_fetch_historical_data": run.flags.can_fetch_historical_data,
            })),
        )
        .await?;

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_run() -> NewRun {
        serde_json::from_value(json!({
            "pipeline_name": "orders",
            "pipeline_priority": 2.0,
            "dag_run_id": "manual__1",
            "topology": {
                "source": {"name": "orders", "category": "db", "sub_type": "postgres"},
                "stage": {"name": "landing", "category": "object_store", "sub_type": "s3"},
                "target": {"name": "dwh", "category": "warehouse", "sub_type": "snowflake"}
            },
            "window": {
                "target_day": "2025-07-24",
                "start": "2025-07-24T00:00:00Z",
                "end": "2025-07-24T00:15:00Z"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_stale_revision_is_a_conflict() {
        let db = LedgerStateDb::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let run_id = db.create_run(new_run()).await.unwrap();
        let mut run = db.get_run(run_id).await.unwrap();

        // first writer wins
        run.revision = 1;
        write_run(&db.conn, &run, 0).await.unwrap();

        // second writer read revision 0 too
        let err = write_run(&db.conn, &run, 0).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        assert_eq!(db.get_run(run_id).await.unwrap().revision, 1);
    }
}
