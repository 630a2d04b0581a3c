use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An executable name plus its ordered argument list.
///
/// The allow-list check happens in the HTTP layer before a spec ever
/// reaches the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(rename = "Command")]
    pub command: String,
    #[serde(rename = "Arguments", default)]
    pub arguments: Vec<String>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Cancelled,
}

impl JobStatus {
    /// True once a job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One accepted request to run a command, tracked from admission to its
/// terminal state.
///
/// Field names on the wire follow the historical JSON contract:
/// `{Command: {Command, Arguments}, StartTime, EndTime, Status}`.
/// `JobId` is included so entries in the queued/completed lists stay
/// addressable, and `Error` only appears when the process could not be
/// started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "JobId")]
    pub id: Uuid,
    #[serde(rename = "Command")]
    pub command: CommandSpec,
    #[serde(rename = "StartTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "EndTime")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "Status")]
    pub status: JobStatus,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// A freshly submitted job. It starts out Queued; admission decides
    /// whether it becomes Running right away.
    pub fn new(command: CommandSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            command,
            start_time: None,
            end_time: None,
            status: JobStatus::Queued,
            error: None,
        }
    }
}
