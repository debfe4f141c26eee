//! Predicates behind the read-only alert projections.

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::Error,
    run::{PipelineRun, ProgressStatus},
};

pub fn validate_factor(name: &str, value: f64) -> Result<(), Error> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    Ok(())
}

fn overran(elapsed_secs: i64, expected_secs: i64, multiplier: f64) -> bool {
    elapsed_secs as f64 > expected_secs as f64 * multiplier
}

/// A run is failing if any stage or the run itself failed, and stuck if an
/// `IN_PROCESS` stage (or the run) has been going for longer than its
/// expected duration times `multiplier`. A stage without an expectation is
/// never considered stuck; the run falls back to `default_expected_secs`.
pub fn is_failing_or_stuck(
    run: &PipelineRun,
    multiplier: f64,
    default_expected_secs: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    if run.pipeline_status == ProgressStatus::Failed {
        return true;
    }

    let stage_flagged = run.stages.iter().any(|(_, record)| match record.status {
        ProgressStatus::Failed => true,
        ProgressStatus::InProcess => match (record.elapsed_secs(now), record.expected_duration_secs) {
            (Some(elapsed), Some(expected)) => overran(elapsed, expected, multiplier),
            _ => false,
        },
        _ => false,
    });

    stage_flagged || is_pipeline_overrun(run, multiplier, default_expected_secs, now)
}

fn is_pipeline_overrun(
    run: &PipelineRun,
    multiplier: f64,
    default_expected_secs: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    if run.pipeline_status != ProgressStatus::InProcess {
        return false;
    }

    let expected = run.pipeline_expected_duration_secs.or(default_expected_secs);

    match (run.pipeline_start_time, expected) {
        (Some(start), Some(expected)) => overran((now - start).num_seconds(), expected, multiplier),
        _ => false,
    }
}

/// `source_count > avg_source_count * factor`; runs lacking either count never qualify.
pub fn is_volume_anomaly(run: &PipelineRun, factor: f64) -> bool {
    match (run.counts.source_count, run.counts.avg_source_count) {
        (Some(source), Some(avg)) => source as f64 > avg * factor,
        _ => false,
    }
}

/// An in-process run that can safely be re-executed and has overrun its
/// expected duration (or `default_expected_secs` when it has none) by
/// `threshold_factor`.
pub fn is_stale(
    run: &PipelineRun,
    threshold_factor: f64,
    default_expected_secs: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    run.flags.continuity_check_performed
        && run.flags.can_fetch_historical_data
        && is_pipeline_overrun(run, threshold_factor, default_expected_secs, now)
}

/// Newest window start a pending run may have to be picked up now.
pub fn max_accepted_time(
    now: DateTime<Utc>,
    x_time_back_secs: i64,
    granularity_secs: i64,
) -> DateTime<Utc> {
    now - Duration::seconds(x_time_back_secs.saturating_add(granularity_secs))
}
