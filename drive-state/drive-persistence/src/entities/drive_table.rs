use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "drive_table")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub run_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub operator_id: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub pipeline_name: String,
    #[sea_orm(column_type = "Double")]
    pub pipeline_priority: f64,
    #[sea_orm(column_type = "Text")]
    pub dag_run_id: String,
    pub pipeline_parallel_thread_id: i32,

    #[sea_orm(column_type = "Text")]
    pub source_name: String,
    #[sea_orm(column_type = "Text")]
    pub source_category: String,
    #[sea_orm(column_type = "Text")]
    pub source_sub_type: String,
    #[sea_orm(column_type = "Text")]
    pub stage_name: String,
    #[sea_orm(column_type = "Text")]
    pub stage_category: String,
    #[sea_orm(column_type = "Text")]
    pub stage_sub_type: String,
    #[sea_orm(column_type = "Text")]
    pub target_name: String,
    #[sea_orm(column_type = "Text")]
    pub target_category: String,
    #[sea_orm(column_type = "Text")]
    pub target_sub_type: String,

    pub target_day: Date,
    pub query_window_start_time: DateTimeWithTimeZone,
    pub query_window_end_time: DateTimeWithTimeZone,
    pub query_window_interval: i64,

    pub source_id: Uuid,
    pub stage_id: Uuid,
    pub target_id: Uuid,
    pub pipeline_id: Uuid,

    pub src_stg_xfer_enabled: bool,
    pub src_stg_xfer_status: String,
    pub src_stg_xfer_start_ts: Option<DateTimeWithTimeZone>,
    pub src_stg_xfer_end_ts: Option<DateTimeWithTimeZone>,
    pub src_stg_xfer_duration: Option<i64>,
    pub src_stg_xfer_exp_duration: Option<i64>,

    pub stg_tgt_xfer_enabled: bool,
    pub stg_tgt_xfer_status: String,
    pub stg_tgt_xfer_start_ts: Option<DateTimeWithTimeZone>,
    pub stg_tgt_xfer_end_ts: Option<DateTimeWithTimeZone>,
    pub stg_tgt_xfer_duration: Option<i64>,
    pub stg_tgt_xfer_exp_duration: Option<i64>,

    pub src_stg_audit_enabled: bool,
    pub src_stg_audit_status: String,
    pub src_stg_audit_start_ts: Option<DateTimeWithTimeZone>,
    pub src_stg_audit_end_ts: Option<DateTimeWithTimeZone>,
    pub src_stg_audit_duration: Option<i64>,
    pub src_stg_audit_exp_duration: Option<i64>,

    pub stg_tgt_audit_enabled: bool,
    pub stg_tgt_audit_status: String,
    pub stg_tgt_audit_start_ts: Option<DateTimeWithTimeZone>,
    pub stg_tgt_audit_end_ts: Option<DateTimeWithTimeZone>,
    pub stg_tgt_audit_duration: Option<i64>,
    pub stg_tgt_audit_exp_duration: Option<i64>,

    pub source_count: Option<i64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub avg_source_count: Option<f64>,
    pub stage_count: Option<i64>,
    pub target_count: Option<i64>,
    pub audit_result: String,

    pub can_fetch_historical_data: bool,
    pub continuity_check_performed: bool,
    pub parallelization_enabled: bool,

    pub phase_completed: Option<String>,
    pub pipeline_status: String,
    pub pipeline_start_time: Option<DateTimeWithTimeZone>,
    pub pipeline_end_time: Option<DateTimeWithTimeZone>,
    pub pipeline_duration: Option<i64>,
    pub pipeline_exp_duration: Option<i64>,
    pub retry_attempt_number: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub email_alerts_send_to: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub miscellaneous_data: Json,

    pub record_first_inserted_time: DateTimeWithTimeZone,
    pub record_last_update_time: DateTimeWithTimeZone,
    pub revision: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
