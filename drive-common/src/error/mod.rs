use chrono::NaiveDate;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database Error: {0}")]
    Database(String),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Resource Not Found: {resource_type} with ID {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("Invalid Transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid Timestamps: {0}")]
    InvalidTimestamps(String),

    #[error("Already Synced: target day {0} was claimed by another sync")]
    AlreadySynced(NaiveDate),

    #[error("Schema Violation: {0}")]
    SchemaViolation(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Internal Error: {0}")]
    Internal(String),

    #[error("Conflict Error: {0}")]
    Conflict(String),
}

impl Error {
    pub fn run_not_found(run_id: impl ToString) -> Self {
        Error::NotFound {
            resource_type: "PipelineRun".into(),
            resource_id: run_id.to_string(),
        }
    }

    /// Stable machine-readable code, surfaced to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE",
            Error::Serialization(_) => "SERIALIZATION",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidTransition(_) => "INVALID_TRANSITION",
            Error::InvalidTimestamps(_) => "INVALID_TIMESTAMPS",
            Error::AlreadySynced(_) => "ALREADY_SYNCED",
            Error::SchemaViolation(_) => "SCHEMA_VIOLATION",
            Error::Config(_) => "CONFIG",
            Error::Internal(_) => "INTERNAL",
            Error::Conflict(_) => "CONFLICT",
        }
    }
}
