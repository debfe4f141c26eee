use async_trait::async_trait;
use chrono::NaiveDate;
use drive_common::{
    error::Error,
    event::{EventSeverity, EventType},
    run::{Phase, ProgressStatus},
    state::SyncDbTrait,
    sync::SyncOutcome,
};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    db::{LedgerStateDb, now},
    entities::{drive_sync_days, drive_table, drive_table_history},
    event_logging::{log_event_direct, log_event_in_txn},
    mapping::{db_error_to_domain, drive_row_to_domain, unique_violation_or},
};

impl LedgerStateDb {
    /// Claims `target_day` and copies `eligible` into the history table
    /// inside `txn`.
    /// ---
    /// Losing the claim to another sync rolls back and yields
    /// `AlreadySynced`, recorded as a `SyncConflict` event.
    pub(crate) async fn copy_day(
        &self,
        txn: DatabaseTransaction,
        target_day: NaiveDate,
        eligible: Vec<drive_table::Model>,
    ) -> Result<SyncOutcome, Error> {
        let synced_at = now();
        let row_count = eligible.len() as u64;

        let mut history_rows = Vec::with_capacity(eligible.len());
        for model in eligible {
            let run = drive_row_to_domain(model)?;

            history_rows.push(drive_table_history::ActiveModel {
                run_id: Set(run.id),
                target_day: Set(run.window.target_day),
                pipeline_id: Set(run.lineage.pipeline_id),
                pipeline_name: Set(run.pipeline_name.clone()),
                audit_result: Set(run.audit_result.to_string()),
                snapshot: Set(serde_json::to_value(&run)?),
                synced_at: Set(synced_at.into()),
            });
        }

        // The marker insert is what serializes concurrent syncs of one day.
        let claim = drive_sync_days::ActiveModel {
            target_day: Set(target_day),
            row_count: Set(row_count as i64),
            synced_at: Set(synced_at.into()),
        };

        let copy_res = async {
            drive_sync_days::Entity::insert(claim)
                .exec_without_returning(&txn)
                .await?;

            drive_table_history::Entity::insert_many(history_rows)
                .exec_without_returning(&txn)
                .await?;

            log_event_in_txn(
                &txn,
                None,
                EventType::SyncCompleted,
                Some(format!("Synced {row_count} runs for {target_day}")),
                Some(json!({ "target_day": target_day, "rows": row_count })),
            )
            .await
        }
        .await;

        if let Err(db_err) = copy_res {
            txn.rollback().await.map_err(db_error_to_domain)?;

            let err = unique_violation_or(db_err, |_| Error::AlreadySynced(target_day));

            if matches!(err, Error::AlreadySynced(_)) {
                warn!(%target_day, "Concurrent sync claimed the target day first");

                log_event_direct(
                    &self.conn,
                    None,
                    EventType::SyncConflict,
                    EventSeverity::Warn,
                    Some(format!("Sync for {target_day} lost the race to another invocation")),
                    Some(json!({ "target_day": target_day })),
                )
                .await?;
            }

            return Err(err);
        }

        txn.commit().await.map_err(db_error_to_domain)?;

        info!(%target_day, rows = row_count, "Sync completed");

        Ok(SyncOutcome::Synced(row_count))
    }
}

#[async_trait]
impl SyncDbTrait for LedgerStateDb {
    async fn run_sync(&self, target_day: NaiveDate) -> Result<SyncOutcome, Error> {
        let txn = self.conn.begin().await.map_err(db_error_to_domain)?;

        let existing_rows = drive_table_history::Entity::find()
            .filter(drive_table_history::Column::TargetDay.eq(target_day))
            .count(&txn)
            .await
            .map_err(db_error_to_domain)?;

        let marker = drive_sync_days::Entity::find_by_id(target_day)
            .one(&txn)
            .await
            .map_err(db_error_to_domain)?;

        if existing_rows > 0 || marker.is_some() {
            txn.rollback().await.map_err(db_error_to_domain)?;

            info!(%target_day, existing_rows, "Target day already synced, skipping");

            log_event_direct(
                &self.conn,
                None,
                EventType::SyncSkipped,
                EventSeverity::Info,
                Some(format!("Sync for {target_day} skipped: already synced")),
                Some(json!({ "target_day": target_day, "existing_rows": existing_rows })),
            )
            .await?;

            return Ok(SyncOutcome::Skipped);
        }

        let eligible = drive_table::Entity::find()
            .filter(drive_table::Column::TargetDay.eq(target_day))
            .filter(drive_table::Column::PhaseCompleted.eq(Phase::Pipeline.to_string()))
            .filter(drive_table::Column::PipelineStatus.eq(ProgressStatus::Completed.to_string()))
            .all(&txn)
            .await
            .map_err(db_error_to_domain)?;

        // Nothing to copy yet. Leave the day open so late runs still get synced.
        if eligible.is_empty() {
            txn.rollback().await.map_err(db_error_to_domain)?;

            info!(%target_day, "No completed runs to sync");

            return Ok(SyncOutcome::Synced(0));
        }

        self.copy_day(txn, target_day, eligible).await
    }

    async fn synced_row_count(&self, target_day: NaiveDate) -> Result<u64, Error> {
        drive_table_history::Entity::find()
            .filter(drive_table_history::Column::TargetDay.eq(target_day))
            .count(&self.conn)
            .await
            .map_err(db_error_to_domain)
    }
}
