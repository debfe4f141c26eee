use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

// It is used by strum to convert the enum to a string
// but the compiler complains that it is unused
#[allow(unused_imports)]
use std::str::FromStr;

/// Progress of a transfer/audit stage, and of the run as a whole.
///
/// Progression is `PENDING -> IN_PROCESS -> COMPLETED | FAILED`.
/// A step may also fail before it ever started (`PENDING -> FAILED`).
#[derive(
    Clone, Debug, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    #[default]
    Pending,
    InProcess,
    Completed,
    Failed,
}

impl ProgressStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Failed)
    }

    /// Same-status moves are accepted for non-terminal states so callers
    /// can amend timestamps or expectations without changing progress.
    pub fn can_transition_to(self, next: ProgressStatus) -> bool {
        use ProgressStatus::*;

        matches!(
            (self, next),
            (Pending, Pending | InProcess | Failed) | (InProcess, InProcess | Completed | Failed)
        )
    }
}

/// One of the four tracked sub-processes of a run.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SrcStgXfer,
    StgTgtXfer,
    SrcStgAudit,
    StgTgtAudit,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::SrcStgXfer,
        Stage::SrcStgAudit,
        Stage::StgTgtXfer,
        Stage::StgTgtAudit,
    ];

    /// Milestone recorded in `phase_completed` once this stage completes.
    pub fn milestone(self) -> Phase {
        match self {
            Stage::SrcStgXfer => Phase::SrcStgXfer,
            Stage::SrcStgAudit => Phase::SrcStgAudit,
            Stage::StgTgtXfer => Phase::StgTgtXfer,
            Stage::StgTgtAudit => Phase::StgTgtAudit,
        }
    }
}

/// Milestones written to `phase_completed`.
/// `PIPELINE` is the only terminal-success milestone.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    SrcStgXfer,
    SrcStgAudit,
    StgTgtXfer,
    StgTgtAudit,
    Pipeline,
}

#[derive(
    Clone, Debug, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditResult {
    Matched,
    Mismatched,
    #[default]
    Unknown,
}
