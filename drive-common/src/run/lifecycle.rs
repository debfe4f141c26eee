use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::{AuditResult, Phase, PipelineRun, ProgressStatus, Stage, compute_audit};

/// Fields a caller may change on a single stage.
/// Unset fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUpdate {
    #[serde(default)]
    pub status: Option<ProgressStatus>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::duration::de_opt_secs")]
    pub expected_duration_secs: Option<i64>,
}

/// Counts reported at the end of a run. Unset counts keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalCounts {
    #[serde(default)]
    pub source_count: Option<i64>,
    #[serde(default)]
    pub avg_source_count: Option<f64>,
    #[serde(default)]
    pub stage_count: Option<i64>,
    #[serde(default)]
    pub target_count: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurgeDecision {
    Allowed,
    Refused { reason: String },
}

fn check_order(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    what: &str,
) -> Result<(), Error> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::InvalidTimestamps(format!(
                "{what}: end {end} is before start {start}"
            )));
        }
    }
    Ok(())
}

impl PipelineRun {
    fn touch(&mut self, now: DateTime<Utc>) {
        // never move backwards, even if the caller's clock does
        self.record_last_update_time = now
            .max(self.record_last_update_time)
            .max(self.record_first_inserted_time);
    }

    /// Applies `update` to one stage, enforcing the status state machine.
    ///
    /// Durations are derived here and cannot be set directly:
    /// `actual_duration = end - start` once the stage reaches a terminal status.
    pub fn apply_stage_update(
        &mut self,
        stage: Stage,
        update: &StageUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if self.is_finalized() {
            return Err(Error::InvalidTransition(format!(
                "Run {} is already finalized",
                self.id
            )));
        }

        let record = self.stages.get(stage);

        if !record.enabled {
            return Err(Error::InvalidTransition(format!(
                "Stage {stage} is disabled for run {}",
                self.id
            )));
        }

        let current = record.status;
        let next = update.status.unwrap_or(current);

        if !current.can_transition_to(next) {
            return Err(Error::InvalidTransition(format!(
                "Stage {stage} of run {} cannot move from {current} to {next}",
                self.id
            )));
        }

        if let Some(expected) = update.expected_duration_secs {
            if expected < 0 {
                return Err(Error::InvalidInput(format!(
                    "Expected duration for stage {stage} must not be negative"
                )));
            }
        }

        if next == ProgressStatus::Pending && update.start_time.is_some() {
            return Err(Error::InvalidInput(format!(
                "Stage {stage} cannot have a start time while PENDING"
            )));
        }

        if !next.is_terminal() && update.end_time.is_some() {
            return Err(Error::InvalidInput(format!(
                "Stage {stage} can only receive an end time with a terminal status"
            )));
        }

        let start_time = match (update.start_time, record.start_time, next) {
            (Some(given), _, _) => Some(given),
            (None, Some(stored), _) => Some(stored),
            (None, None, ProgressStatus::InProcess) => Some(now),
            (None, None, _) => None,
        };

        let end_time = if next.is_terminal() {
            Some(update.end_time.unwrap_or(now))
        } else {
            None
        };

        check_order(start_time, end_time, &format!("stage {stage}"))?;

        let actual_duration_secs = match (start_time, end_time) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        };

        let record = self.stages.get_mut(stage);
        record.status = next;
        record.start_time = start_time;
        record.end_time = end_time;
        record.actual_duration_secs = actual_duration_secs;
        if update.expected_duration_secs.is_some() {
            record.expected_duration_secs = update.expected_duration_secs;
        }

        if next == ProgressStatus::InProcess && self.pipeline_status == ProgressStatus::Pending {
            self.pipeline_status = ProgressStatus::InProcess;
            self.pipeline_start_time = self.pipeline_start_time.or(start_time);
        }

        if next == ProgressStatus::Completed {
            self.phase_completed = Some(stage.milestone());
        }

        self.touch(now);

        Ok(())
    }

    /// Closes the run: merges counts, computes the audit result and the
    /// final status. Disabled stages are left untouched.
    pub fn finalize(&mut self, counts: &FinalCounts, now: DateTime<Utc>) -> Result<AuditResult, Error> {
        if self.is_finalized() {
            return Err(Error::InvalidTransition(format!(
                "Run {} is already finalized",
                self.id
            )));
        }

        let start = self.pipeline_start_time.unwrap_or(now);
        check_order(Some(start), Some(now), "pipeline")?;

        if counts.source_count.is_some() {
            self.counts.source_count = counts.source_count;
        }
        if counts.avg_source_count.is_some() {
            self.counts.avg_source_count = counts.avg_source_count;
        }
        if counts.stage_count.is_some() {
            self.counts.stage_count = counts.stage_count;
        }
        if counts.target_count.is_some() {
            self.counts.target_count = counts.target_count;
        }

        self.audit_result = compute_audit(&self.stages, &self.counts);

        let all_enabled_completed = self
            .stages
            .iter()
            .filter(|(_, record)| record.enabled)
            .all(|(_, record)| record.status == ProgressStatus::Completed);

        if all_enabled_completed {
            self.pipeline_status = ProgressStatus::Completed;
            self.phase_completed = Some(Phase::Pipeline);
        } else {
            self.pipeline_status = ProgressStatus::Failed;
        }

        self.pipeline_start_time = Some(start);
        self.pipeline_end_time = Some(now);
        self.pipeline_duration_secs = Some((now - start).num_seconds());

        self.touch(now);

        Ok(self.audit_result)
    }

    /// Prepares the run for re-execution: every stage that has not
    /// completed goes back to `PENDING`, completed stages are kept,
    /// and the retry counter moves up by one.
    pub fn reset_for_retry(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.is_terminal_success() {
            return Err(Error::InvalidTransition(format!(
                "Run {} completed successfully and cannot be retried",
                self.id
            )));
        }

        self.retry_attempt_number = self.retry_attempt_number.checked_add(1).ok_or_else(|| {
            Error::Internal(format!("Retry counter overflow for run {}", self.id))
        })?;

        self.pipeline_status = ProgressStatus::Pending;
        self.pipeline_start_time = None;
        self.pipeline_end_time = None;
        self.pipeline_duration_secs = None;

        for stage in Stage::ALL {
            let record = self.stages.get_mut(stage);
            if record.status == ProgressStatus::Completed {
                continue;
            }
            record.status = ProgressStatus::Pending;
            record.start_time = None;
            record.end_time = None;
            record.actual_duration_secs = None;
        }

        self.touch(now);

        Ok(())
    }

    /// Source data may only be purged when it can be fetched again.
    pub fn purge_decision(&self) -> PurgeDecision {
        if !self.flags.can_fetch_historical_data {
            return PurgeDecision::Refused {
                reason: format!(
                    "historical data cannot be re-fetched for run {} (audit {})",
                    self.id, self.audit_result
                ),
            };
        }

        PurgeDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone};
    use uuid::Uuid;

    use super::*;
    use crate::run::{
        ExtractionWindow, RecordCounts, RunFlags, StageRecord, StageRecords, Topology,
        compute_lineage,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 1, 0, 0).unwrap()
    }

    fn run(enabled: [bool; 4]) -> PipelineRun {
        let window = ExtractionWindow {
            target_day: NaiveDate::from_ymd_opt(2025, 7, 24).unwrap(),
            start: Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 7, 24, 0, 15, 0).unwrap(),
        };
        let topology = Topology::default();
        let lineage = compute_lineage(&topology, &window);

        PipelineRun {
            id: Uuid::new_v4(),
            operator_id: None,
            pipeline_name: "orders".into(),
            pipeline_priority: 1.0,
            dag_run_id: "dag-1".into(),
            pipeline_parallel_thread_id: 0,
            topology,
            window,
            lineage,
            stages: StageRecords {
                src_stg_xfer: StageRecord::new(enabled[0], Some(60)),
                stg_tgt_xfer: StageRecord::new(enabled[1], Some(60)),
                src_stg_audit: StageRecord::new(enabled[2], None),
                stg_tgt_audit: StageRecord::new(enabled[3], None),
            },
            counts: RecordCounts::default(),
            audit_result: AuditResult::Unknown,
            flags: RunFlags::default(),
            phase_completed: None,
            pipeline_status: ProgressStatus::Pending,
            pipeline_start_time: None,
            pipeline_end_time: None,
            pipeline_duration_secs: None,
            pipeline_expected_duration_secs: None,
            retry_attempt_number: 0,
            email_alerts_send_to: vec![],
            miscellaneous_data: Default::default(),
            record_first_inserted_time: t0(),
            record_last_update_time: t0(),
            revision: 0,
        }
    }

    fn status(s: ProgressStatus) -> StageUpdate {
        StageUpdate {
            status: Some(s),
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_progression_derives_duration() {
        let mut r = run([true; 4]);
        let t1 = t0() + Duration::seconds(10);
        let t2 = t1 + Duration::seconds(45);

        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::InProcess), t1)
            .unwrap();
        assert_eq!(r.pipeline_status, ProgressStatus::InProcess);
        assert_eq!(r.pipeline_start_time, Some(t1));

        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::Completed), t2)
            .unwrap();

        let rec = &r.stages.src_stg_xfer;
        assert_eq!(rec.actual_duration_secs, Some(45));
        assert_eq!(r.phase_completed, Some(Phase::SrcStgXfer));
        assert_eq!(r.record_last_update_time, t2);
        assert_eq!(r.record_first_inserted_time, t0());
    }

    #[test]
    fn test_backward_move_is_rejected() {
        let mut r = run([true; 4]);
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap();

        let err = r
            .apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::Pending), t0())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[test]
    fn test_disabled_stage_is_rejected() {
        let mut r = run([true, false, true, false]);
        let err = r
            .apply_stage_update(Stage::StgTgtXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(r.stages.stg_tgt_xfer.status, ProgressStatus::Pending);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let mut r = run([true; 4]);
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap();

        let update = StageUpdate {
            status: Some(ProgressStatus::Completed),
            end_time: Some(t0() - Duration::seconds(1)),
            ..Default::default()
        };
        let err = r.apply_stage_update(Stage::SrcStgXfer, &update, t0()).unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamps(_)));
        assert_eq!(r.stages.src_stg_xfer.status, ProgressStatus::InProcess);
    }

    #[test]
    fn test_finalize_keeps_disabled_stages_pending() {
        let mut r = run([true, false, false, false]);
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap();
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::Completed), t0())
            .unwrap();

        let counts = FinalCounts {
            source_count: Some(50),
            stage_count: Some(50),
            ..Default::default()
        };
        let audit = r.finalize(&counts, t0() + Duration::seconds(5)).unwrap();

        assert_eq!(audit, AuditResult::Matched);
        assert_eq!(r.pipeline_status, ProgressStatus::Completed);
        assert_eq!(r.phase_completed, Some(Phase::Pipeline));
        assert_eq!(r.stages.stg_tgt_xfer.status, ProgressStatus::Pending);
        assert_eq!(r.stages.src_stg_audit.status, ProgressStatus::Pending);
        assert_eq!(r.pipeline_duration_secs, Some(5));

        assert!(matches!(
            r.finalize(&counts, t0()).unwrap_err(),
            Error::InvalidTransition(_)
        ));
    }

    #[test]
    fn test_finalize_with_unfinished_stage_fails_run() {
        let mut r = run([true, true, false, false]);
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap();

        r.finalize(&FinalCounts::default(), t0()).unwrap();
        assert_eq!(r.pipeline_status, ProgressStatus::Failed);
        assert_eq!(r.phase_completed, None);
        assert_eq!(r.audit_result, AuditResult::Unknown);
    }

    #[test]
    fn test_reset_for_retry_keeps_completed_stages() {
        let mut r = run([true; 4]);
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap();
        r.apply_stage_update(Stage::SrcStgXfer, &status(ProgressStatus::Completed), t0())
            .unwrap();
        r.apply_stage_update(Stage::StgTgtXfer, &status(ProgressStatus::InProcess), t0())
            .unwrap();

        r.reset_for_retry(t0()).unwrap();

        assert_eq!(r.retry_attempt_number, 1);
        assert_eq!(r.pipeline_status, ProgressStatus::Pending);
        assert_eq!(r.pipeline_start_time, None);
        assert_eq!(r.stages.src_stg_xfer.status, ProgressStatus::Completed);
        assert_eq!(r.stages.stg_tgt_xfer.status, ProgressStatus::Pending);
        assert_eq!(r.stages.stg_tgt_xfer.start_time, None);

        r.reset_for_retry(t0()).unwrap();
        assert_eq!(r.retry_attempt_number, 2);
    }

    #[test]
    fn test_purge_refused_without_historical_recovery() {
        let mut r = run([true; 4]);
        r.audit_result = AuditResult::Mismatched;
        assert!(matches!(r.purge_decision(), PurgeDecision::Refused { .. }));

        r.flags.can_fetch_historical_data = true;
        assert_eq!(r.purge_decision(), PurgeDecision::Allowed);
    }
}
