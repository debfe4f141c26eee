use sea_orm_migration::prelude::*;

#[derive(Iden)]
#[iden = "drive_table_history"]
pub enum DriveTableHistory {
    Table,
    #[iden = "run_id"]
    RunId,
    #[iden = "target_day"]
    TargetDay,
    #[iden = "pipeline_id"]
    PipelineId,
    #[iden = "pipeline_name"]
    PipelineName,
    #[iden = "audit_result"]
    AuditResult,
    #[iden = "snapshot"]
    Snapshot,
    #[iden = "synced_at"]
    SyncedAt,
}

#[derive(Iden)]
#[iden = "drive_sync_days"]
pub enum DriveSyncDays {
    Table,
    #[iden = "target_day"]
    TargetDay,
    #[iden = "row_count"]
    RowCount,
    #[iden = "synced_at"]
    SyncedAt,
}
