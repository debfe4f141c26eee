//! Pre-flight decision of which transfers a run can perform,
//! given which external connections are reachable.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionHealth {
    pub source: bool,
    pub stage: bool,
    pub target: bool,
    /// The ledger itself. Without it nothing can be recorded.
    pub drive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCapabilities {
    pub exit_run: bool,
    pub can_process_source_to_stage: bool,
    pub can_process_stage_to_target: bool,
    pub message: String,
}

impl PipelineCapabilities {
    fn exit(message: String) -> Self {
        Self {
            exit_run: true,
            can_process_source_to_stage: false,
            can_process_stage_to_target: false,
            message,
        }
    }
}

pub fn determine_capabilities(health: &ConnectionHealth, dag_run_id: &str) -> PipelineCapabilities {
    if !health.drive {
        error!(dag_run_id, "Drive connection unavailable, exiting run");
        return PipelineCapabilities::exit(format!(
            "Drive connection unavailable. Cannot log pipeline status. Exiting DAG run {dag_run_id}."
        ));
    }

    if !(health.source || health.stage || health.target) {
        warn!(dag_run_id, "No data connections available, exiting run");
        return PipelineCapabilities::exit(format!(
            "No data connections available (source, stage, target). Exiting DAG run {dag_run_id}; \
             it will be retried on the next scheduled run."
        ));
    }

    let to_stage = health.source && health.stage;
    let to_target = health.stage && health.target;

    let message = match (to_stage, to_target) {
        (true, true) => format!("Complete pipeline: source-to-stage and stage-to-target. DAG run {dag_run_id}."),
        (true, false) => format!(
            "Partial pipeline: target unavailable, source-to-stage only. DAG run {dag_run_id}."
        ),
        (false, true) => format!(
            "Partial pipeline: source unavailable, stage-to-target only. DAG run {dag_run_id}."
        ),
        (false, false) => format!(
            "No transfer possible; status is logged to the drive table only. DAG run {dag_run_id}."
        ),
    };

    info!(
        dag_run_id,
        can_process_source_to_stage = to_stage,
        can_process_stage_to_target = to_target,
        "Pipeline capability determination completed"
    );

    PipelineCapabilities {
        exit_run: false,
        can_process_source_to_stage: to_stage,
        can_process_stage_to_target: to_target,
        message,
    }
}
