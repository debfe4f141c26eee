use sea_orm_migration::prelude::*;

/// The one wide ledger row. Column names are consumed by dashboards
/// and alerting as-is.
#[derive(Iden)]
#[iden = "drive_table"]
pub enum DriveTable {
    Table,
    #[iden = "run_id"]
    RunId,
    #[iden = "operator_id"]
    OperatorId,
    #[iden = "pipeline_name"]
    PipelineName,
    #[iden = "pipeline_priority"]
    PipelinePriority,
    #[iden = "dag_run_id"]
    DagRunId,
    #[iden = "pipeline_parallel_thread_id"]
    PipelineParallelThreadId,

    #[iden = "source_name"]
    SourceName,
    #[iden = "source_category"]
    SourceCategory,
    #[iden = "source_sub_type"]
    SourceSubType,
    #[iden = "stage_name"]
    StageName,
    #[iden = "stage_category"]
    StageCategory,
    #[iden = "stage_sub_type"]
    StageSubType,
    #[iden = "target_name"]
    TargetName,
    #[iden = "target_category"]
    TargetCategory,
    #[iden = "target_sub_type"]
    TargetSubType,

    #[iden = "target_day"]
    TargetDay,
    #[iden = "query_window_start_time"]
    QueryWindowStartTime,
    #[iden = "query_window_end_time"]
    QueryWindowEndTime,
    #[iden = "query_window_interval"]
    QueryWindowInterval,

    #[iden = "source_id"]
    SourceId,
    #[iden = "stage_id"]
    StageId,
    #[iden = "target_id"]
    TargetId,
    #[iden = "pipeline_id"]
    PipelineId,

    #[iden = "src_stg_xfer_enabled"]
    SrcStgXferEnabled,
    #[iden = "src_stg_xfer_status"]
    SrcStgXferStatus,
    #[iden = "src_stg_xfer_start_ts"]
    SrcStgXferStartTs,
    #[iden = "src_stg_xfer_end_ts"]
    SrcStgXferEndTs,
    #[iden = "src_stg_xfer_duration"]
    SrcStgXferDuration,
    #[iden = "src_stg_xfer_exp_duration"]
    SrcStgXferExpDuration,

    #[iden = "stg_tgt_xfer_enabled"]
    StgTgtXferEnabled,
    #[iden = "stg_tgt_xfer_status"]
    StgTgtXferStatus,
    #[iden = "stg_tgt_xfer_start_ts"]
    StgTgtXferStartTs,
    #[iden = "stg_tgt_xfer_end_ts"]
    StgTgtXferEndTs,
    #[iden = "stg_tgt_xfer_duration"]
    StgTgtXferDuration,
    #[iden = "stg_tgt_xfer_exp_duration"]
    StgTgtXferExpDuration,

    #[iden = "src_stg_audit_enabled"]
    SrcStgAuditEnabled,
    #[iden = "src_stg_audit_status"]
    SrcStgAuditStatus,
    #[iden = "src_stg_audit_start_ts"]
    SrcStgAuditStartTs,
    #[iden = "src_stg_audit_end_ts"]
    SrcStgAuditEndTs,
    #[iden = "src_stg_audit_duration"]
    SrcStgAuditDuration,
    #[iden = "src_stg_audit_exp_duration"]
    SrcStgAuditExpDuration,

    #[iden = "stg_tgt_audit_enabled"]
    StgTgtAuditEnabled,
    #[iden = "stg_tgt_audit_status"]
    StgTgtAuditStatus,
    #[iden = "stg_tgt_audit_start_ts"]
    StgTgtAuditStartTs,
    #[iden = "stg_tgt_audit_end_ts"]
    StgTgtAuditEndTs,
    #[iden = "stg_tgt_audit_duration"]
    StgTgtAuditDuration,
    #[iden = "stg_tgt_audit_exp_duration"]
    StgTgtAuditExpDuration,

    #[iden = "source_count"]
    SourceCount,
    #[iden = "avg_source_count"]
    AvgSourceCount,
    #[iden = "stage_count"]
    StageCount,
    #[iden = "target_count"]
    TargetCount,
    #[iden = "audit_result"]
    AuditResult,

    #[iden = "can_fetch_historical_data"]
    CanFetchHistoricalData,
    #[iden = "continuity_check_performed"]
    ContinuityCheckPerformed,
    #[iden = "parallelization_enabled"]
    ParallelizationEnabled,

    #[iden = "phase_completed"]
    PhaseCompleted,
    #[iden = "pipeline_status"]
    PipelineStatus,
    #[iden = "pipeline_start_time"]
    PipelineStartTime,
    #[iden = "pipeline_end_time"]
    PipelineEndTime,
    #[iden = "pipeline_duration"]
    PipelineDuration,
    #[iden = "pipeline_exp_duration"]
    PipelineExpDuration,
    #[iden = "retry_attempt_number"]
    RetryAttemptNumber,

    #[iden = "email_alerts_send_to"]
    EmailAlertsSendTo,
    #[iden = "miscellaneous_data"]
    MiscellaneousData,

    #[iden = "record_first_inserted_time"]
    RecordFirstInsertedTime,
    #[iden = "record_last_update_time"]
    RecordLastUpdateTime,
    #[iden = "revision"]
    Revision,
}
