mod common;

use chrono::{Duration, Utc};
use common::*;
use drive_common::{
    alert::max_accepted_time,
    error::Error,
    run::{FinalCounts, ProgressStatus, RunFilter, Stage, StageUpdate},
    state::{AlertDbTrait, RunDbTrait},
};
use rand::seq::SliceRandom;

#[tokio::test]
async fn test_priority_ordering() {
    let db = ledger().await;

    let mut priorities = vec![5.0, 1.3, 7.5, 2.0];
    priorities.shuffle(&mut rand::rng());

    for (i, priority) in priorities.iter().enumerate() {
        db.create_run(new_run(&format!("scheduled__{i}"), *priority))
            .await
            .unwrap();
    }

    let ordered: Vec<f64> = db
        .priority_ordered()
        .await
        .unwrap()
        .iter()
        .map(|run| run.pipeline_priority)
        .collect();

    assert_eq!(ordered, vec![1.3, 2.0, 5.0, 7.5]);
}

#[tokio::test]
async fn test_priority_ties_break_on_start_time() {
    let db = ledger().await;

    let late = db.create_run(new_run("scheduled__1", 1.0)).await.unwrap();
    let early = db.create_run(new_run("scheduled__2", 1.0)).await.unwrap();
    let unstarted = db.create_run(new_run("scheduled__3", 1.0)).await.unwrap();

    let now = Utc::now();
    db.update_stage(late, Stage::SrcStgXfer, started_at(now - Duration::minutes(1)))
        .await
        .unwrap();
    db.update_stage(early, Stage::SrcStgXfer, started_at(now - Duration::minutes(9)))
        .await
        .unwrap();

    let ids: Vec<_> = db
        .priority_ordered()
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![early, late, unstarted]);
}

async fn run_with_source_count(source_count: i64) -> bool {
    let db = ledger().await;

    let mut run = new_run("scheduled__1", 1.0);
    run.avg_source_count = Some(400.0);
    let run_id = db.create_run(run).await.unwrap();

    let counts = FinalCounts {
        source_count: Some(source_count),
        ..Default::default()
    };
    db.finalize_run(run_id, counts).await.unwrap();

    db.volume_anomalies(2.0)
        .await
        .unwrap()
        .iter()
        .any(|run| run.id == run_id)
}

#[tokio::test]
async fn test_volume_anomalies() {
    assert!(run_with_source_count(1000).await);
    assert!(!run_with_source_count(700).await);
}

#[tokio::test]
async fn test_failing_or_stuck() {
    let db = ledger().await;
    let now = Utc::now();

    let stuck = db.create_run(new_run("scheduled__1", 1.0)).await.unwrap();
    let update = StageUpdate {
        expected_duration_secs: Some(600),
        ..started_at(now - Duration::hours(2))
    };
    db.update_stage(stuck, Stage::SrcStgXfer, update)
        .await
        .unwrap();

    let failed = db.create_run(new_run("scheduled__2", 2.0)).await.unwrap();
    db.update_stage(failed, Stage::SrcStgXfer, to(ProgressStatus::Failed))
        .await
        .unwrap();

    let healthy = db.create_run(new_run("scheduled__3", 3.0)).await.unwrap();
    db.update_stage(healthy, Stage::SrcStgXfer, to(ProgressStatus::InProcess))
        .await
        .unwrap();

    let flagged: Vec<_> = db
        .failing_or_stuck(3.0, None, Utc::now())
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(flagged, vec![stuck, failed]);

    assert!(matches!(
        db.failing_or_stuck(0.0, None, now).await.unwrap_err(),
        Error::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_stale_runs_can_be_reset() {
    let db = ledger().await;
    let two_hours_ago = Utc::now() - Duration::hours(2);

    let stale = db.create_run(new_run("scheduled__1", 1.0)).await.unwrap();
    db.update_stage(stale, Stage::SrcStgXfer, started_at(two_hours_ago))
        .await
        .unwrap();

    let mut unrecoverable = new_run("scheduled__2", 1.0);
    unrecoverable.flags.can_fetch_historical_data = false;
    let unrecoverable = db.create_run(unrecoverable).await.unwrap();
    db.update_stage(unrecoverable, Stage::SrcStgXfer, started_at(two_hours_ago))
        .await
        .unwrap();

    let found = db
        .stale_runs(&RunFilter::default(), 3.0, None, Utc::now())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, stale);

    let reset = db.reset_for_retry(stale).await.unwrap();
    assert_eq!(reset.pipeline_status, ProgressStatus::Pending);
    assert_eq!(reset.retry_attempt_number, 1);

    assert!(
        db.stale_runs(&RunFilter::default(), 3.0, None, Utc::now())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_runs_without_expectation_use_default_duration() {
    let db = ledger().await;
    let now = Utc::now();

    let mut run = new_run("scheduled__1", 1.0);
    run.pipeline_expected_duration_secs = None;
    let run_id = db.create_run(run).await.unwrap();
    db.update_stage(run_id, Stage::SrcStgXfer, started_at(now - Duration::days(3)))
        .await
        .unwrap();

    let all = RunFilter::default();
    assert!(db.stale_runs(&all, 3.0, None, now).await.unwrap().is_empty());
    assert!(db.failing_or_stuck(3.0, None, now).await.unwrap().is_empty());

    let stale = db.stale_runs(&all, 3.0, Some(3600), now).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, run_id);

    let stuck = db.failing_or_stuck(3.0, Some(3600), now).await.unwrap();
    assert_eq!(stuck.len(), 1);

    // a day-long default is not yet overrun by 3x after 3 days
    assert!(
        db.stale_runs(&all, 3.0, Some(24 * 3600), now)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_stale_runs_respect_filter() {
    let db = ledger().await;
    let two_hours_ago = Utc::now() - Duration::hours(2);

    let orders = db.create_run(new_run("scheduled__1", 1.0)).await.unwrap();

    let mut other = new_run("scheduled__2", 2.0);
    other.pipeline_name = "invoices_daily".into();
    other.topology.source = location("invoices", "db", "mysql");
    let other = db.create_run(other).await.unwrap();

    let third = db.create_run(new_run("scheduled__3", 3.0)).await.unwrap();

    for run_id in [orders, other, third] {
        db.update_stage(run_id, Stage::SrcStgXfer, started_at(two_hours_ago))
            .await
            .unwrap();
    }

    let by_name = RunFilter {
        pipeline_name: Some("orders_daily".into()),
        ..Default::default()
    };
    let ids: Vec<_> = db
        .stale_runs(&by_name, 3.0, None, Utc::now())
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![orders, third]);

    let by_source = RunFilter {
        source: Some(location("invoices", "db", "mysql")),
        ..Default::default()
    };
    let ids: Vec<_> = db
        .stale_runs(&by_source, 3.0, None, Utc::now())
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![other]);

    let first_only = RunFilter {
        limit: Some(1),
        ..by_name
    };
    let ids: Vec<_> = db
        .stale_runs(&first_only, 3.0, None, Utc::now())
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![orders]);
}

#[tokio::test]
async fn test_ready_pending() {
    let db = ledger().await;
    let now = Utc::now();

    let mut older = new_run("scheduled__1", 1.0);
    older.window = window_at(now - Duration::hours(3));
    let older = db.create_run(older).await.unwrap();

    let mut newer = new_run("scheduled__2", 1.0);
    newer.window = window_at(now - Duration::hours(1));
    let newer = db.create_run(newer).await.unwrap();

    let mut too_recent = new_run("scheduled__3", 1.0);
    too_recent.window = window_at(now - Duration::minutes(5));
    db.create_run(too_recent).await.unwrap();

    let mut unchecked = new_run("scheduled__4", 1.0);
    unchecked.window = window_at(now - Duration::hours(2));
    unchecked.flags.continuity_check_performed = false;
    db.create_run(unchecked).await.unwrap();

    let max_accepted = max_accepted_time(now, 0, 15 * 60);

    let ids: Vec<_> = db
        .ready_pending(&RunFilter::default(), max_accepted)
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![older, newer]);

    let limited = RunFilter {
        limit: Some(1),
        ..Default::default()
    };
    let ids: Vec<_> = db
        .ready_pending(&limited, max_accepted)
        .await
        .unwrap()
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![older]);
}
