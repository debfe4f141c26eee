use chrono::{DateTime, FixedOffset, Utc};
use drive_common::{
    error::Error,
    event::{EventLogRecord, EventSeverity, EventType},
    run::{
        AuditResult, ExtractionWindow, LineageIds, Location, Phase, PipelineRun, ProgressStatus,
        RecordCounts, RunFlags, StageRecord, StageRecords, Topology,
    },
};
use sea_orm::{ActiveValue::Set, DbErr, SqlErr};

use crate::entities::{drive_table, event_log};

pub(crate) fn db_error_to_domain(e: DbErr) -> Error {
    Error::Database(e.to_string())
}

/// Unique violations carry meaning for callers; everything else is a plain
/// database failure.
pub(crate) fn unique_violation_or(e: DbErr, on_unique: impl FnOnce(String) -> Error) -> Error {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => on_unique(detail),
        _ => db_error_to_domain(e),
    }
}

fn parse_column<T: std::str::FromStr>(column: &str, value: &str) -> Result<T, Error> {
    value.parse::<T>().map_err(|_| {
        Error::Internal(format!(
            "Failed to parse column '{column}' with value '{value}'"
        ))
    })
}

fn to_utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

pub(crate) fn to_db(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    ts.into()
}

#[allow(clippy::too_many_arguments)]
fn stage_to_domain(
    column: &str,
    enabled: bool,
    status: &str,
    start_ts: Option<DateTime<FixedOffset>>,
    end_ts: Option<DateTime<FixedOffset>>,
    duration: Option<i64>,
    exp_duration: Option<i64>,
) -> Result<StageRecord, Error> {
    Ok(StageRecord {
        enabled,
        status: parse_column(column, status)?,
        start_time: start_ts.map(to_utc),
        end_time: end_ts.map(to_utc),
        actual_duration_secs: duration,
        expected_duration_secs: exp_duration,
    })
}

pub(crate) fn drive_row_to_domain(model: drive_table::Model) -> Result<PipelineRun, Error> {
    let stages = StageRecords {
        src_stg_xfer: stage_to_domain(
            "src_stg_xfer_status",
            model.src_stg_xfer_enabled,
            &model.src_stg_xfer_status,
            model.src_stg_xfer_start_ts,
            model.src_stg_xfer_end_ts,
            model.src_stg_xfer_duration,
            model.src_stg_xfer_exp_duration,
        )?,
        stg_tgt_xfer: stage_to_domain(
            "stg_tgt_xfer_status",
            model.stg_tgt_xfer_enabled,
            &model.stg_tgt_xfer_status,
            model.stg_tgt_xfer_start_ts,
            model.stg_tgt_xfer_end_ts,
            model.stg_tgt_xfer_duration,
            model.stg_tgt_xfer_exp_duration,
        )?,
        src_stg_audit: stage_to_domain(
            "src_stg_audit_status",
            model.src_stg_audit_enabled,
            &model.src_stg_audit_status,
            model.src_stg_audit_start_ts,
            model.src_stg_audit_end_ts,
            model.src_stg_audit_duration,
            model.src_stg_audit_exp_duration,
        )?,
        stg_tgt_audit: stage_to_domain(
            "stg_tgt_audit_status",
            model.stg_tgt_audit_enabled,
            &model.stg_tgt_audit_status,
            model.stg_tgt_audit_start_ts,
            model.stg_tgt_audit_end_ts,
            model.stg_tgt_audit_duration,
            model.stg_tgt_audit_exp_duration,
        )?,
    };

    let phase_completed = model
        .phase_completed
        .as_deref()
        .map(|phase| parse_column::<Phase>("phase_completed", phase))
        .transpose()?;

    let email_alerts_send_to: Vec<String> = serde_json::from_value(model.email_alerts_send_to)?;

    let miscellaneous_data = match model.miscellaneous_data {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            return Err(Error::Internal(format!(
                "Stored miscellaneous_data is not an object: {other}"
            )));
        }
    };

    Ok(PipelineRun {
        id: model.run_id,
        operator_id: model.operator_id,
        pipeline_name: model.pipeline_name,
        pipeline_priority: model.pipeline_priority,
        dag_run_id: model.dag_run_id,
        pipeline_parallel_thread_id: model.pipeline_parallel_thread_id,
        topology: Topology {
            source: Location {
                name: model.source_name,
                category: model.source_category,
                sub_type: model.source_sub_type,
            },
            stage: Location {
                name: model.stage_name,
                category: model.stage_category,
                sub_type: model.stage_sub_type,
            },
            target: Location {
                name: model.target_name,
                category: model.target_category,
                sub_type: model.target_sub_type,
            },
        },
        window: ExtractionWindow {
            target_day: model.target_day,
            start: to_utc(model.query_window_start_time),
            end: to_utc(model.query_window_end_time),
        },
        lineage: LineageIds {
            source_id: model.source_id,
            stage_id: model.stage_id,
            target_id: model.target_id,
            pipeline_id: model.pipeline_id,
        },
        stages,
        counts: RecordCounts {
            source_count: model.source_count,
            avg_source_count: model.avg_source_count,
            stage_count: model.stage_count,
            target_count: model.target_count,
        },
        audit_result: parse_column::<AuditResult>("audit_result", &model.audit_result)?,
        flags: RunFlags {
            can_fetch_historical_data: model.can_fetch_historical_data,
            continuity_check_performed: model.continuity_check_performed,
            parallelization_enabled: model.parallelization_enabled,
        },
        phase_completed,
        pipeline_status: parse_column::<ProgressStatus>("pipeline_status", &model.pipeline_status)?,
        pipeline_start_time: model.pipeline_start_time.map(to_utc),
        pipeline_end_time: model.pipeline_end_time.map(to_utc),
        pipeline_duration_secs: model.pipeline_duration,
        pipeline_expected_duration_secs: model.pipeline_exp_duration,
        retry_attempt_number: model.retry_attempt_number,
        email_alerts_send_to,
        miscellaneous_data,
        record_first_inserted_time: to_utc(model.record_first_inserted_time),
        record_last_update_time: to_utc(model.record_last_update_time),
        revision: model.revision,
    })
}

/// Full row for an insert. Updates start from this and unset the
/// columns that must never change.
pub(crate) fn domain_run_to_db(run: &PipelineRun) -> drive_table::ActiveModel {
    let stages = &run.stages;

    drive_table::ActiveModel {
        run_id: Set(run.id),
        operator_id: Set(run.operator_id.clone()),
        pipeline_name: Set(run.pipeline_name.clone()),
        pipeline_priority: Set(run.pipeline_priority),
        dag_run_id: Set(run.dag_run_id.clone()),
        pipeline_parallel_thread_id: Set(run.pipeline_parallel_thread_id),

        source_name: Set(run.topology.source.name.clone()),
        source_category: Set(run.topology.source.category.clone()),
        source_sub_type: Set(run.topology.source.sub_type.clone()),
        stage_name: Set(run.topology.stage.name.clone()),
        stage_category: Set(run.topology.stage.category.clone()),
        stage_sub_type: Set(run.topology.stage.sub_type.clone()),
        target_name: Set(run.topology.target.name.clone()),
        target_category: Set(run.topology.target.category.clone()),
        target_sub_type: Set(run.topology.target.sub_type.clone()),

        target_day: Set(run.window.target_day),
        query_window_start_time: Set(to_db(run.window.start)),
        query_window_end_time: Set(to_db(run.window.end)),
        query_window_interval: Set(run.window.interval_secs()),

        source_id: Set(run.lineage.source_id),
        stage_id: Set(run.lineage.stage_id),
        target_id: Set(run.lineage.target_id),
        pipeline_id: Set(run.lineage.pipeline_id),

        src_stg_xfer_enabled: Set(stages.src_stg_xfer.enabled),
        src_stg_xfer_status: Set(stages.src_stg_xfer.status.to_string()),
        src_stg_xfer_start_ts: Set(stages.src_stg_xfer.start_time.map(to_db)),
        src_stg_xfer_end_ts: Set(stages.src_stg_xfer.end_time.map(to_db)),
        src_stg_xfer_duration: Set(stages.src_stg_xfer.actual_duration_secs),
        src_stg_xfer_exp_duration: Set(stages.src_stg_xfer.expected_duration_secs),

        stg_tgt_xfer_enabled: Set(stages.stg_tgt_xfer.enabled),
        stg_tgt_xfer_status: Set(stages.stg_tgt_xfer.status.to_string()),
        stg_tgt_xfer_start_ts: Set(stages.stg_tgt_xfer.start_time.map(to_db)),
        stg_tgt_xfer_end_ts: Set(stages.stg_tgt_xfer.end_time.map(to_db)),
        stg_tgt_xfer_duration: Set(stages.stg_tgt_xfer.actual_duration_secs),
        stg_tgt_xfer_exp_duration: Set(stages.stg_tgt_xfer.expected_duration_secs),

        src_stg_audit_enabled: Set(stages.src_stg_audit.enabled),
        src_stg_audit_status: Set(stages.src_stg_audit.status.to_string()),
        src_stg_audit_start_ts: Set(stages.src_stg_audit.start_time.map(to_db)),
        src_stg_audit_end_ts: Set(stages.src_stg_audit.end_time.map(to_db)),
        src_stg_audit_duration: Set(stages.src_stg_audit.actual_duration_secs),
        src_stg_audit_exp_duration: Set(stages.src_stg_audit.expected_duration_secs),

        stg_tgt_audit_enabled: Set(stages.stg_tgt_audit.enabled),
        stg_tgt_audit_status: Set(stages.stg_tgt_audit.status.to_string()),
        stg_tgt_audit_start_ts: Set(stages.stg_tgt_audit.start_time.map(to_db)),
        stg_tgt_audit_end_ts: Set(stages.stg_tgt_audit.end_time.map(to_db)),
        stg_tgt_audit_duration: Set(stages.stg_tgt_audit.actual_duration_secs),
        stg_tgt_audit_exp_duration: Set(stages.stg_tgt_audit.expected_duration_secs),

        source_count: Set(run.counts.source_count),
        avg_source_count: Set(run.counts.avg_source_count),
        stage_count: Set(run.counts.stage_count),
        target_count: Set(run.counts.target_count),
        audit_result: Set(run.audit_result.to_string()),

        can_fetch_historical_data: Set(run.flags.can_fetch_historical_data),
        continuity_check_performed: Set(run.flags.continuity_check_performed),
        parallelization_enabled: Set(run.flags.parallelization_enabled),

        phase_completed: Set(run.phase_completed.map(|phase| phase.to_string())),
        pipeline_status: Set(run.pipeline_status.to_string()),
        pipeline_start_time: Set(run.pipeline_start_time.map(to_db)),
        pipeline_end_time: Set(run.pipeline_end_time.map(to_db)),
        pipeline_duration: Set(run.pipeline_duration_secs),
        pipeline_exp_duration: Set(run.pipeline_expected_duration_secs),
        retry_attempt_number: Set(run.retry_attempt_number),

        email_alerts_send_to: Set(serde_json::Value::from(run.email_alerts_send_to.clone())),
        miscellaneous_data: Set(serde_json::Value::Object(run.miscellaneous_data.clone())),

        record_first_inserted_time: Set(to_db(run.record_first_inserted_time)),
        record_last_update_time: Set(to_db(run.record_last_update_time)),
        revision: Set(run.revision),
    }
}

pub(crate) fn event_log_to_domain(model: event_log::Model) -> Result<EventLogRecord, Error> {
    let event_type = model.event_type.parse::<EventType>().map_err(|e| {
        Error::Internal(format!(
            "Failed to parse event type '{}': {}",
            model.event_type, e
        ))
    })?;

    let severity = model
        .severity
        .parse::<EventSeverity>()
        .unwrap_or_else(|_| EventSeverity::from(event_type));

    Ok(EventLogRecord {
        event_id: model.event_id,
        run_id: model.run_id,
        timestamp: to_utc(model.timestamp),
        event_type,
        severity,
        message: model.message,
        metadata: model.metadata,
    })
}
