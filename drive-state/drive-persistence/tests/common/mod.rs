#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use drive_common::run::{
    ExtractionWindow, Location, NewRun, ProgressStatus, RunFlags, StagePlan, StagePlans,
    StageUpdate, Topology,
};
use drive_persistence::LedgerStateDb;

pub async fn ledger() -> LedgerStateDb {
    let db = LedgerStateDb::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 24).unwrap()
}

pub fn location(name: &str, category: &str, sub_type: &str) -> Location {
    Location {
        name: name.into(),
        category: category.into(),
        sub_type: sub_type.into(),
    }
}

pub fn topology() -> Topology {
    Topology {
        source: location("orders", "db", "postgres"),
        stage: location("landing", "object_store", "s3"),
        target: location("dwh", "warehouse", "snowflake"),
    }
}

pub fn window_at(start: DateTime<Utc>) -> ExtractionWindow {
    ExtractionWindow {
        target_day: start.date_naive(),
        start,
        end: start + Duration::minutes(15),
    }
}

pub fn new_run(dag_run_id: &str, priority: f64) -> NewRun {
    NewRun {
        operator_id: Some("airflow".into()),
        pipeline_name: "orders_daily".into(),
        pipeline_priority: priority,
        dag_run_id: dag_run_id.into(),
        pipeline_parallel_thread_id: 0,
        topology: topology(),
        window: window_at(Utc.from_utc_datetime(&day().and_hms_opt(0, 0, 0).unwrap())),
        stages: StagePlans::default(),
        pipeline_expected_duration_secs: Some(600),
        avg_source_count: None,
        flags: RunFlags {
            can_fetch_historical_data: true,
            continuity_check_performed: true,
            parallelization_enabled: false,
        },
        email_alerts_send_to: vec!["oncall@example.com".into()],
        miscellaneous_data: None,
    }
}

/// Only the source-to-stage transfer runs.
pub fn src_stg_only(mut run: NewRun) -> NewRun {
    run.stages = StagePlans {
        src_stg_xfer: StagePlan::default(),
        stg_tgt_xfer: StagePlan::disabled(),
        src_stg_audit: StagePlan::disabled(),
        stg_tgt_audit: StagePlan::disabled(),
    };
    run
}

pub fn to(status: ProgressStatus) -> StageUpdate {
    StageUpdate {
        status: Some(status),
        ..Default::default()
    }
}

pub fn started_at(start: DateTime<Utc>) -> StageUpdate {
    StageUpdate {
        status: Some(ProgressStatus::InProcess),
        start_time: Some(start),
        ..Default::default()
    }
}
