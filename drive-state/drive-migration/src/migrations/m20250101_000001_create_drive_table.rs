use sea_orm_migration::prelude::*;

use crate::db_entities::{DriveSyncDays, DriveTable, DriveTableHistory, EventLog};

const IDX_DRIVE_TABLE_DAG_RUN_THREAD: &str = "idx_drive_table_dag_run_thread";
const IDX_DRIVE_TABLE_PIPELINE_STATUS: &str = "idx_drive_table_pipeline_status";
const IDX_DRIVE_TABLE_TARGET_DAY: &str = "idx_drive_table_target_day";
const IDX_DRIVE_TABLE_PIPELINE_ID: &str = "idx_drive_table_pipeline_id";
const IDX_DRIVE_TABLE_PRIORITY: &str = "idx_drive_table_priority";
const IDX_DRIVE_TABLE_HISTORY_TARGET_DAY: &str = "idx_drive_table_history_target_day";
const IDX_EVENT_LOG_RUN_ID_TIMESTAMP: &str = "idx_drive_event_log_run_id_timestamp";
const IDX_EVENT_LOG_TIMESTAMP: &str = "idx_drive_event_log_timestamp";

/// The six columns every transfer/audit sub-record carries.
struct StageColumns {
    enabled: DriveTable,
    status: DriveTable,
    start_ts: DriveTable,
    end_ts: DriveTable,
    duration: DriveTable,
    exp_duration: DriveTable,
}

impl StageColumns {
    fn add_to(self, table: &mut TableCreateStatement) {
        table
            .col(
                ColumnDef::new(self.enabled)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(
                ColumnDef::new(self.status)
                    .string()
                    .not_null()
                    .default("PENDING"),
            )
            .col(ColumnDef::new(self.start_ts).timestamp_with_time_zone())
            .col(ColumnDef::new(self.end_ts).timestamp_with_time_zone())
            .col(ColumnDef::new(self.duration).big_integer())
            .col(ColumnDef::new(self.exp_duration).big_integer());
    }
}

fn stage_columns() -> [StageColumns; 4] {
    [
        StageColumns {
            enabled: DriveTable::SrcStgXferEnabled,
            status: DriveTable::SrcStgXferStatus,
            start_ts: DriveTable::SrcStgXferStartTs,
            end_ts: DriveTable::SrcStgXferEndTs,
            duration: DriveTable::SrcStgXferDuration,
            exp_duration: DriveTable::SrcStgXferExpDuration,
        },
        StageColumns {
            enabled: DriveTable::StgTgtXferEnabled,
            status: DriveTable::StgTgtXferStatus,
            start_ts: DriveTable::StgTgtXferStartTs,
            end_ts: DriveTable::StgTgtXferEndTs,
            duration: DriveTable::StgTgtXferDuration,
            exp_duration: DriveTable::StgTgtXferExpDuration,
        },
        StageColumns {
            enabled: DriveTable::SrcStgAuditEnabled,
            status: DriveTable::SrcStgAuditStatus,
            start_ts: DriveTable::SrcStgAuditStartTs,
            end_ts: DriveTable::SrcStgAuditEndTs,
            duration: DriveTable::SrcStgAuditDuration,
            exp_duration: DriveTable::SrcStgAuditExpDuration,
        },
        StageColumns {
            enabled: DriveTable::StgTgtAuditEnabled,
            status: DriveTable::StgTgtAuditStatus,
            start_ts: DriveTable::StgTgtAuditStartTs,
            end_ts: DriveTable::StgTgtAuditEndTs,
            duration: DriveTable::StgTgtAuditDuration,
            exp_duration: DriveTable::StgTgtAuditExpDuration,
        },
    ]
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut drive_table = Table::create();
        drive_table
            .table(DriveTable::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(DriveTable::RunId)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(DriveTable::OperatorId).text())
            .col(ColumnDef::new(DriveTable::PipelineName).text().not_null())
            .col(
                ColumnDef::new(DriveTable::PipelinePriority)
                    .double()
                    .not_null(),
            )
            .col(ColumnDef::new(DriveTable::DagRunId).text().not_null())
            .col(
                ColumnDef::new(DriveTable::PipelineParallelThreadId)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(DriveTable::SourceName).text().not_null())
            .col(ColumnDef::new(DriveTable::SourceCategory).text().not_null())
            .col(ColumnDef::new(DriveTable::SourceSubType).text().not_null())
            .col(ColumnDef::new(DriveTable::StageName).text().not_null())
            .col(ColumnDef::new(DriveTable::StageCategory).text().not_null())
            .col(ColumnDef::new(DriveTable::StageSubType).text().not_null())
            .col(ColumnDef::new(DriveTable::TargetName).text().not_null())
            .col(ColumnDef::new(DriveTable::TargetCategory).text().not_null())
            .col(ColumnDef::new(DriveTable::TargetSubType).text().not_null())
            .col(ColumnDef::new(DriveTable::TargetDay).date().not_null())
            .col(
                ColumnDef::new(DriveTable::QueryWindowStartTime)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(DriveTable::QueryWindowEndTime)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(DriveTable::QueryWindowInterval)
                    .big_integer()
                    .not_null(),
            )
            .col(ColumnDef::new(DriveTable::SourceId).uuid().not_null())
            .col(ColumnDef::new(DriveTable::StageId).uuid().not_null())
            .col(ColumnDef::new(DriveTable::TargetId).uuid().not_null())
            .col(ColumnDef::new(DriveTable::PipelineId).uuid().not_null());

        for columns in stage_columns() {
            columns.add_to(&mut drive_table);
        }

        drive_table
            .col(ColumnDef::new(DriveTable::SourceCount).big_integer())
            .col(ColumnDef::new(DriveTable::AvgSourceCount).double())
            .col(ColumnDef::new(DriveTable::StageCount).big_integer())
            .col(ColumnDef::new(DriveTable::TargetCount).big_integer())
            .col(
                ColumnDef::new(DriveTable::AuditResult)
                    .string()
                    .not_null()
                    .default("UNKNOWN"),
            )
            .col(
                ColumnDef::new(DriveTable::CanFetchHistoricalData)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(DriveTable::ContinuityCheckPerformed)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(DriveTable::ParallelizationEnabled)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(ColumnDef::new(DriveTable::PhaseCompleted).string())
            .col(
                ColumnDef::new(DriveTable::PipelineStatus)
                    .string()
                    .not_null()
                    .default("PENDING"),
            )
            .col(ColumnDef::new(DriveTable::PipelineStartTime).timestamp_with_time_zone())
            .col(ColumnDef::new(DriveTable::PipelineEndTime).timestamp_with_time_zone())
            .col(ColumnDef::new(DriveTable::PipelineDuration).big_integer())
            .col(ColumnDef::new(DriveTable::PipelineExpDuration).big_integer())
            .col(
                ColumnDef::new(DriveTable::RetryAttemptNumber)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(DriveTable::EmailAlertsSendTo)
                    .json_binary()
                    .not_null(),
            )
            .col(
                ColumnDef::new(DriveTable::MiscellaneousData)
                    .json_binary()
                    .not_null(),
            )
            .col(
                ColumnDef::new(DriveTable::RecordFirstInsertedTime)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(DriveTable::RecordLastUpdateTime)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(DriveTable::Revision)
                    .big_integer()
                    .not_null()
                    .default(0),
            );

        manager.create_table(drive_table.to_owned()).await?;

        manager
            .create_table(
                Table::create()
                    .table(DriveTableHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DriveTableHistory::RunId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DriveTableHistory::TargetDay).date().not_null())
                    .col(ColumnDef::new(DriveTableHistory::PipelineId).uuid().not_null())
                    .col(ColumnDef::new(DriveTableHistory::PipelineName).text().not_null())
                    .col(ColumnDef::new(DriveTableHistory::AuditResult).string().not_null())
                    .col(
                        ColumnDef::new(DriveTableHistory::Snapshot)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriveTableHistory::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DriveSyncDays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DriveSyncDays::TargetDay)
                            .date()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DriveSyncDays::RowCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriveSyncDays::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventLog::EventId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventLog::RunId).uuid())
                    .col(
                        ColumnDef::new(EventLog::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventLog::EventType).string().not_null())
                    .col(ColumnDef::new(EventLog::Severity).string().not_null())
                    .col(ColumnDef::new(EventLog::Message).text())
                    .col(ColumnDef::new(EventLog::Metadata).json_binary())
                    .to_owned(),
            )
            .await?;

        // The logical key of a run. Duplicate inserts surface as conflicts.
        manager
            .create_index(
                Index::create()
                    .name(IDX_DRIVE_TABLE_DAG_RUN_THREAD)
                    .table(DriveTable::Table)
                    .col(DriveTable::DagRunId)
                    .col(DriveTable::PipelineParallelThreadId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_DRIVE_TABLE_PIPELINE_STATUS)
                    .table(DriveTable::Table)
                    .col(DriveTable::PipelineStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_DRIVE_TABLE_TARGET_DAY)
                    .table(DriveTable::Table)
                    .col(DriveTable::TargetDay)
                    .col(DriveTable::PhaseCompleted)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_DRIVE_TABLE_PIPELINE_ID)
                    .table(DriveTable::Table)
                    .col(DriveTable::PipelineId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_DRIVE_TABLE_PRIORITY)
                    .table(DriveTable::Table)
                    .col(DriveTable::PipelinePriority)
                    .col(DriveTable::PipelineStartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_DRIVE_TABLE_HISTORY_TARGET_DAY)
                    .table(DriveTableHistory::Table)
                    .col(DriveTableHistory::TargetDay)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_EVENT_LOG_RUN_ID_TIMESTAMP)
                    .table(EventLog::Table)
                    .col(EventLog::RunId)
                    .col(EventLog::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_EVENT_LOG_TIMESTAMP)
                    .table(EventLog::Table)
                    .col(EventLog::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Indexes go with their tables.
        manager
            .drop_table(Table::drop().table(EventLog::Table).if_exists().to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(DriveSyncDays::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(DriveTableHistory::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DriveTable::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}
