use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{capabilities::PipelineCapabilities, error::Error};

use super::{
    AuditResult, ExtractionWindow, PipelineRun, ProgressStatus, RecordCounts, RunFlags,
    StageRecord, StageRecords, Topology, compute_lineage,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "crate::duration::de_opt_secs")]
    pub expected_duration_secs: Option<i64>,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for StagePlan {
    fn default() -> Self {
        Self {
            enabled: true,
            expected_duration_secs: None,
        }
    }
}

impl StagePlan {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            expected_duration_secs: None,
        }
    }

    fn into_record(self) -> StageRecord {
        StageRecord::new(self.enabled, self.expected_duration_secs)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlans {
    #[serde(default)]
    pub src_stg_xfer: StagePlan,
    #[serde(default)]
    pub stg_tgt_xfer: StagePlan,
    #[serde(default)]
    pub src_stg_audit: StagePlan,
    #[serde(default)]
    pub stg_tgt_audit: StagePlan,
}

/// Everything the orchestrator knows when a run starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    #[serde(default)]
    pub operator_id: Option<String>,
    pub pipeline_name: String,
    pub pipeline_priority: f64,
    pub dag_run_id: String,
    #[serde(default)]
    pub pipeline_parallel_thread_id: i32,
    pub topology: Topology,
    pub window: ExtractionWindow,
    #[serde(default)]
    pub stages: StagePlans,
    #[serde(default, deserialize_with = "crate::duration::de_opt_secs")]
    pub pipeline_expected_duration_secs: Option<i64>,
    #[serde(default)]
    pub avg_source_count: Option<f64>,
    #[serde(default)]
    pub flags: RunFlags,
    #[serde(default)]
    pub email_alerts_send_to: Vec<String>,
    #[serde(default)]
    pub miscellaneous_data: Option<serde_json::Value>,
}

impl NewRun {
    pub fn validate(&self) -> Result<(), Error> {
        if self.pipeline_name.trim().is_empty() {
            return Err(Error::InvalidInput("pipeline_name must not be empty".into()));
        }

        if self.dag_run_id.trim().is_empty() {
            return Err(Error::InvalidInput("dag_run_id must not be empty".into()));
        }

        if !self.pipeline_priority.is_finite() {
            return Err(Error::InvalidInput(format!(
                "pipeline_priority must be a finite number, got {}",
                self.pipeline_priority
            )));
        }

        if self.window.end < self.window.start {
            return Err(Error::InvalidTimestamps(format!(
                "window end {} is before window start {}",
                self.window.end, self.window.start
            )));
        }

        if let Some(avg) = self.avg_source_count {
            if !avg.is_finite() || avg < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "avg_source_count must be a non-negative number, got {avg}"
                )));
            }
        }

        for address in &self.email_alerts_send_to {
            let trimmed = address.trim();
            if trimmed.is_empty() || !trimmed.contains('@') {
                return Err(Error::SchemaViolation(format!(
                    "email_alerts_send_to entry '{address}' is not an address"
                )));
            }
        }

        match &self.miscellaneous_data {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Object(_)) => {}
            Some(other) => {
                return Err(Error::SchemaViolation(format!(
                    "miscellaneous_data must be a JSON object, got {other}"
                )));
            }
        }

        Ok(())
    }

    /// Disables transfers (and their audits) that the available
    /// connections cannot serve, so those steps stay `PENDING`.
    pub fn apply_capabilities(&mut self, capabilities: &PipelineCapabilities) {
        if !capabilities.can_process_source_to_stage {
            self.stages.src_stg_xfer = StagePlan::disabled();
            self.stages.src_stg_audit = StagePlan::disabled();
        }
        if !capabilities.can_process_stage_to_target {
            self.stages.stg_tgt_xfer = StagePlan::disabled();
            self.stages.stg_tgt_audit = StagePlan::disabled();
        }
    }

    pub fn into_run(self, id: Uuid, now: DateTime<Utc>) -> Result<PipelineRun, Error> {
        self.validate()?;

        let lineage = compute_lineage(&self.topology, &self.window);

        let miscellaneous_data = match self.miscellaneous_data {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        Ok(PipelineRun {
            id,
            operator_id: self.operator_id,
            pipeline_name: self.pipeline_name,
            pipeline_priority: self.pipeline_priority,
            dag_run_id: self.dag_run_id,
            pipeline_parallel_thread_id: self.pipeline_parallel_thread_id,
            topology: self.topology,
            window: self.window,
            lineage,
            stages: StageRecords {
                src_stg_xfer: self.stages.src_stg_xfer.into_record(),
                stg_tgt_xfer: self.stages.stg_tgt_xfer.into_record(),
                src_stg_audit: self.stages.src_stg_audit.into_record(),
                stg_tgt_audit: self.stages.stg_tgt_audit.into_record(),
            },
            counts: RecordCounts {
                avg_source_count: self.avg_source_count,
                ..Default::default()
            },
            audit_result: AuditResult::Unknown,
            flags: self.flags,
            phase_completed: None,
            pipeline_status: ProgressStatus::Pending,
            pipeline_start_time: None,
            pipeline_end_time: None,
            pipeline_duration_secs: None,
            pipeline_expected_duration_secs: self.pipeline_expected_duration_secs,
            retry_attempt_number: 0,
            email_alerts_send_to: self.email_alerts_send_to,
            miscellaneous_data,
            record_first_inserted_time: now,
            record_last_update_time: now,
            revision: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::capabilities::{ConnectionHealth, determine_capabilities};

    fn new_run() -> NewRun {
        serde_json::from_value(json!({
            "pipeline_name": "orders",
            "pipeline_priority": 1.3,
            "dag_run_id": "scheduled__2025-07-24",
            "topology": {
                "source": {"name": "orders", "category": "db", "sub_type": "postgres"},
                "stage": {"name": "landing", "category": "object_store", "sub_type": "s3"},
                "target": {"name": "dwh", "category": "warehouse", "sub_type": "snowflake"}
            },
            "window": {
                "target_day": "2025-07-24",
                "start": "2025-07-24T00:00:00Z",
                "end": "2025-07-24T00:15:00Z"
            },
            "stages": {"src_stg_xfer": {"expected_duration_secs": "10m"}},
            "email_alerts_send_to": ["oncall@example.com"],
            "miscellaneous_data": {"batch": 7}
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_from_json() {
        let run = new_run();
        assert!(run.stages.stg_tgt_audit.enabled);
        assert_eq!(run.stages.src_stg_xfer.expected_duration_secs, Some(600));
        assert_eq!(
            run.window.target_day,
            NaiveDate::from_ymd_opt(2025, 7, 24).unwrap()
        );
    }

    #[test]
    fn test_into_run_starts_pending() {
        let now = Utc.with_ymd_and_hms(2025, 7, 24, 1, 0, 0).unwrap();
        let run = new_run().into_run(Uuid::new_v4(), now).unwrap();

        assert_eq!(run.pipeline_status, ProgressStatus::Pending);
        assert!(run.stages.iter().all(|(_, r)| r.status == ProgressStatus::Pending));
        assert_eq!(run.record_first_inserted_time, now);
        assert_eq!(run.window.interval_secs(), 900);
        assert_eq!(run.miscellaneous_data.get("batch"), Some(&json!(7)));
    }

    #[test]
    fn test_validation_errors() {
        let mut run = new_run();
        run.miscellaneous_data = Some(json!([1, 2, 3]));
        assert!(matches!(run.validate(), Err(Error::SchemaViolation(_))));

        let mut run = new_run();
        run.email_alerts_send_to = vec!["nobody".into()];
        assert!(matches!(run.validate(), Err(Error::SchemaViolation(_))));

        let mut run = new_run();
        run.window.end = run.window.start - chrono::Duration::minutes(1);
        assert!(matches!(run.validate(), Err(Error::InvalidTimestamps(_))));

        let mut run = new_run();
        run.pipeline_priority = f64::NAN;
        assert!(matches!(run.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_capabilities_disable_unreachable_stages() {
        let mut run = new_run();
        let caps = determine_capabilities(
            &ConnectionHealth {
                source: true,
                stage: true,
                target: false,
                drive: true,
            },
            &run.dag_run_id.clone(),
        );

        run.apply_capabilities(&caps);
        assert!(run.stages.src_stg_xfer.enabled);
        assert!(!run.stages.stg_tgt_xfer.enabled);
        assert!(!run.stages.stg_tgt_audit.enabled);
    }
}
