mod log_record;
mod severity;

pub use log_record::{EventLogRecord, EventType};
pub use severity::EventSeverity;
