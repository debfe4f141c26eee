use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::EventSeverity;

// It is used by strum to convert the enum to a string
// but the compiler complains that it is unused
#[allow(unused_imports)]
use std::str::FromStr;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogRecord {
    pub event_id: Uuid,
    pub run_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub severity: EventSeverity,
    pub message: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum EventType {
    // Run lifecycle
    RunCreated,
    StageUpdated,
    RunFinalized,
    RunResetForRetry,
    RunUpdateFailed,

    // Safety guard
    SourcePurgeAllowed,
    SourcePurgeRefused,

    // Sync job
    SyncCompleted,
    SyncSkipped,
    SyncConflict,

    // Engine/system events
    EngineEvent,
}
