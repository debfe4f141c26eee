use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Location, ProgressStatus};

/// Equality filters for listing runs. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilter {
    #[serde(default)]
    pub pipeline_name: Option<String>,
    #[serde(default)]
    pub dag_run_id: Option<String>,
    #[serde(default)]
    pub pipeline_status: Option<ProgressStatus>,
    #[serde(default)]
    pub target_day: Option<NaiveDate>,
    #[serde(default)]
    pub pipeline_id: Option<Uuid>,
    #[serde(default)]
    pub source: Option<Location>,
    #[serde(default)]
    pub limit: Option<u64>,
}
