mod audit;
mod filter;
mod lifecycle;
mod lineage;
mod new_run;
mod record;
mod status;

pub use audit::compute_audit;
pub use filter::RunFilter;
pub use lifecycle::{FinalCounts, PurgeDecision, StageUpdate};
pub use lineage::{LINEAGE_NAMESPACE, compute_lineage, location_id, pipeline_id};
pub use new_run::{NewRun, StagePlan, StagePlans};
pub use record::{
    ExtractionWindow, LineageIds, Location, PipelineRun, RecordCounts, RunFlags, StageRecord,
    StageRecords, Topology,
};
pub use status::{AuditResult, Phase, ProgressStatus, Stage};
