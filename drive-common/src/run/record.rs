use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditResult, Phase, ProgressStatus, Stage};

/// Free-text classification of a source, stage, or target location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub category: String,
    pub sub_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub source: Location,
    pub stage: Location,
    pub target: Location,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWindow {
    pub target_day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExtractionWindow {
    pub fn interval_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageIds {
    pub source_id: Uuid,
    pub stage_id: Uuid,
    pub target_id: Uuid,
    pub pipeline_id: Uuid,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub enabled: bool,
    pub status: ProgressStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub actual_duration_secs: Option<i64>,
    pub expected_duration_secs: Option<i64>,
}

impl StageRecord {
    pub fn new(enabled: bool, expected_duration_secs: Option<i64>) -> Self {
        Self {
            enabled,
            expected_duration_secs,
            ..Default::default()
        }
    }

    /// Seconds spent in the stage so far, or in total once it has ended.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let start = self.start_time?;
        Some((self.end_time.unwrap_or(now) - start).num_seconds())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecords {
    pub src_stg_xfer: StageRecord,
    pub stg_tgt_xfer: StageRecord,
    pub src_stg_audit: StageRecord,
    pub stg_tgt_audit: StageRecord,
}

impl StageRecords {
    pub fn get(&self, stage: Stage) -> &StageRecord {
        match stage {
            Stage::SrcStgXfer => &self.src_stg_xfer,
            Stage::StgTgtXfer => &self.stg_tgt_xfer,
            Stage::SrcStgAudit => &self.src_stg_audit,
            Stage::StgTgtAudit => &self.stg_tgt_audit,
        }
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut StageRecord {
        match stage {
            Stage::SrcStgXfer => &mut self.src_stg_xfer,
            Stage::StgTgtXfer => &mut self.stg_tgt_xfer,
            Stage::SrcStgAudit => &mut self.src_stg_audit,
            Stage::StgTgtAudit => &mut self.stg_tgt_audit,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageRecord)> {
        Stage::ALL.into_iter().map(move |stage| (stage, self.get(stage)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub source_count: Option<i64>,
    pub avg_source_count: Option<f64>,
    pub stage_count: Option<i64>,
    pub target_count: Option<i64>,
}

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFlags {
    pub can_fetch_historical_data: bool,
    pub continuity_check_performed: bool,
    pub parallelization_enabled: bool,
}

/// One row of the drive table: a single (pipeline execution, parallel thread).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub operator_id: Option<String>,
    pub pipeline_name: String,
    /// Lower is more urgent.
    pub pipeline_priority: f64,
    pub dag_run_id: String,
    pub pipeline_parallel_thread_id: i32,
    pub topology: Topology,
    pub window: ExtractionWindow,
    pub lineage: LineageIds,
    pub stages: StageRecords,
    pub counts: RecordCounts,
    pub audit_result: AuditResult,
    pub flags: RunFlags,
    pub phase_completed: Option<Phase>,
    pub pipeline_status: ProgressStatus,
    pub pipeline_start_time: Option<DateTime<Utc>>,
    pub pipeline_end_time: Option<DateTime<Utc>>,
    pub pipeline_duration_secs: Option<i64>,
    pub pipeline_expected_duration_secs: Option<i64>,
    pub retry_attempt_number: i32,
    pub email_alerts_send_to: Vec<String>,
    pub miscellaneous_data: serde_json::Map<String, serde_json::Value>,
    pub record_first_inserted_time: DateTime<Utc>,
    pub record_last_update_time: DateTime<Utc>,
    /// Bumped on every write; guards against concurrent mutation of one run.
    pub revision: i64,
}

impl PipelineRun {
    pub fn is_finalized(&self) -> bool {
        self.pipeline_end_time.is_some()
    }

    pub fn is_terminal_success(&self) -> bool {
        self.phase_completed == Some(Phase::Pipeline)
            && self.pipeline_status == ProgressStatus::Completed
    }
}
