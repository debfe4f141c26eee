use chrono::{DateTime, Utc};
use drive_common::{
    error::Error,
    event::EventSeverity,
    run::{PipelineRun, ProgressStatus, RunFilter},
    state::{AlertDbTrait, BaseDbTrait, DatabaseTrait, RunDbTrait},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct AlertReport {
    pub failing_or_stuck: Vec<PipelineRun>,
    pub volume_anomalies: Vec<PipelineRun>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    pub total_found: usize,
    pub stale_found: usize,
    pub converted_count: usize,
}

pub async fn collect_alerts(
    db: &dyn DatabaseTrait,
    stuck_multiplier: f64,
    volume_factor: f64,
    default_expected_secs: Option<i64>,
    now: DateTime<Utc>,
) -> Result<AlertReport, Error> {
    let failing_or_stuck = db
        .failing_or_stuck(stuck_multiplier, default_expected_secs, now)
        .await?;
    for run in &failing_or_stuck {
        warn!(
            run_id = %run.id,
            pipeline_name = %run.pipeline_name,
            pipeline_status = %run.pipeline_status,
            recipients = ?run.email_alerts_send_to,
            "Run failing or stuck"
        );
    }

    let volume_anomalies = db.volume_anomalies(volume_factor).await?;
    for run in &volume_anomalies {
        warn!(
            run_id = %run.id,
            pipeline_name = %run.pipeline_name,
            source_count = ?run.counts.source_count,
            avg_source_count = ?run.counts.avg_source_count,
            "Source volume anomaly"
        );
    }

    Ok(AlertReport {
        failing_or_stuck,
        volume_anomalies,
    })
}

/// Finds in-process runs within `scope` that overran and resets each one
/// for retry. A failed reset is logged and does not stop the rest.
pub async fn reap_stale(
    db: &dyn DatabaseTrait,
    scope: &RunFilter,
    threshold_factor: f64,
    default_expected_secs: Option<i64>,
    now: DateTime<Utc>,
) -> Result<ReapReport, Error> {
    let in_process = RunFilter {
        pipeline_status: Some(ProgressStatus::InProcess),
        limit: None,
        ..scope.clone()
    };

    let mut report = ReapReport {
        total_found: db.list_runs(&in_process).await?.len(),
        ..Default::default()
    };

    if report.total_found == 0 {
        info!("No in-process runs found");
        return Ok(report);
    }

    let stale = db
        .stale_runs(scope, threshold_factor, default_expected_secs, now)
        .await?;
    report.stale_found = stale.len();

    for run in &stale {
        let elapsed_secs = run
            .pipeline_start_time
            .map(|start| (now - start).num_seconds());

        warn!(
            run_id = %run.id,
            pipeline_name = %run.pipeline_name,
            elapsed_secs = ?elapsed_secs,
            expected_secs = ?run.pipeline_expected_duration_secs.or(default_expected_secs),
            threshold_factor,
            "Stale run detected"
        );

        match db.reset_for_retry(run.id).await {
            Ok(reset) => {
                report.converted_count += 1;
                info!(
                    run_id = %run.id,
                    retry_attempt_number = reset.retry_attempt_number,
                    "Stale run converted to PENDING"
                );
            }
            Err(e) => {
                error!(run_id = %run.id, error = %e, "Failed to convert stale run");
            }
        }
    }

    db.log_system_event(
        None,
        format!(
            "Stale run sweep: {} in process, {} stale, {} converted",
            report.total_found, report.stale_found, report.converted_count
        ),
        Some(json!(report)),
        if report.converted_count < report.stale_found {
            EventSeverity::Warn
        } else {
            EventSeverity::Info
        },
    )
    .await?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use drive_common::run::{
        ExtractionWindow, Location, NewRun, RunFlags, Stage, StageUpdate, Topology,
    };
    use drive_persistence::LedgerStateDb;

    use super::*;

    fn location(name: &str) -> Location {
        Location {
            name: name.into(),
            category: "db".into(),
            sub_type: "postgres".into(),
        }
    }

    fn new_run(pipeline_name: &str, dag_run_id: &str, now: DateTime<Utc>) -> NewRun {
        NewRun {
            operator_id: None,
            pipeline_name: pipeline_name.into(),
            pipeline_priority: 1.0,
            dag_run_id: dag_run_id.into(),
            pipeline_parallel_thread_id: 0,
            topology: Topology {
                source: location("src"),
                stage: location("stg"),
                target: location("tgt"),
            },
            window: ExtractionWindow {
                target_day: now.date_naive(),
                start: now - Duration::hours(4),
                end: now - Duration::hours(3),
            },
            stages: Default::default(),
            pipeline_expected_duration_secs: Some(600),
            avg_source_count: None,
            flags: RunFlags {
                can_fetch_historical_data: true,
                continuity_check_performed: true,
                parallelization_enabled: false,
            },
            email_alerts_send_to: vec![],
            miscellaneous_data: None,
        }
    }

    async fn start(db: &LedgerStateDb, run: NewRun, started: DateTime<Utc>) {
        let run_id = db.create_run(run).await.unwrap();
        let update = StageUpdate {
            status: Some(ProgressStatus::InProcess),
            start_time: Some(started),
            ..Default::default()
        };
        db.update_stage(run_id, Stage::SrcStgXfer, update)
            .await
            .unwrap();
    }

    async fn ledger() -> LedgerStateDb {
        let db = LedgerStateDb::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_reap_stale_converts_overrun_runs() {
        let db = ledger().await;

        let now = Utc::now();
        start(&db, new_run("orders", "scheduled__1", now), now - Duration::hours(2)).await;
        start(&db, new_run("orders", "scheduled__2", now), now - Duration::minutes(1)).await;

        let scope = RunFilter::default();
        let report = reap_stale(&db, &scope, 3.0, None, now).await.unwrap();
        assert_eq!(
            report,
            ReapReport {
                total_found: 2,
                stale_found: 1,
                converted_count: 1,
            }
        );

        let again = reap_stale(&db, &scope, 3.0, None, now).await.unwrap();
        assert_eq!(again.total_found, 1);
        assert_eq!(again.stale_found, 0);
    }

    #[tokio::test]
    async fn test_reap_stale_stays_within_scope() {
        let db = ledger().await;

        let now = Utc::now();
        let two_hours_ago = now - Duration::hours(2);
        start(&db, new_run("orders", "scheduled__1", now), two_hours_ago).await;
        start(&db, new_run("invoices", "scheduled__2", now), two_hours_ago).await;

        let scope = RunFilter {
            pipeline_name: Some("invoices".into()),
            ..Default::default()
        };
        let report = reap_stale(&db, &scope, 3.0, None, now).await.unwrap();
        assert_eq!(
            report,
            ReapReport {
                total_found: 1,
                stale_found: 1,
                converted_count: 1,
            }
        );

        let orders = RunFilter {
            pipeline_name: Some("orders".into()),
            ..Default::default()
        };
        let untouched = db.list_runs(&orders).await.unwrap();
        assert_eq!(untouched[0].pipeline_status, ProgressStatus::InProcess);
        assert_eq!(untouched[0].retry_attempt_number, 0);
    }

    #[tokio::test]
    async fn test_reap_stale_uses_default_expectation() {
        let db = ledger().await;

        let now = Utc::now();
        let mut run = new_run("orders", "scheduled__1", now);
        run.pipeline_expected_duration_secs = None;
        start(&db, run, now - Duration::days(3)).await;

        let scope = RunFilter::default();
        let report = reap_stale(&db, &scope, 3.0, None, now).await.unwrap();
        assert_eq!(report.stale_found, 0);

        let report = reap_stale(&db, &scope, 3.0, Some(3600), now)
            .await
            .unwrap();
        assert_eq!(report.converted_count, 1);
    }

    #[tokio::test]
    async fn test_collect_alerts() {
        let db = ledger().await;

        let now = Utc::now();
        start(&db, new_run("orders", "scheduled__1", now), now - Duration::hours(2)).await;

        let report = collect_alerts(&db, 3.0, 2.0, None, now).await.unwrap();
        assert_eq!(report.failing_or_stuck.len(), 1);
        assert!(report.volume_anomalies.is_empty());
    }
}
