use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::EventType;

#[derive(
    Clone, Debug, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventSeverity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<EventType> for EventSeverity {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::StageUpdated => EventSeverity::Debug,
            EventType::SourcePurgeRefused | EventType::SyncConflict => EventSeverity::Warn,
            EventType::RunUpdateFailed => EventSeverity::Error,
            _ => EventSeverity::Info,
        }
    }
}
