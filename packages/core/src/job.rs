//! Job domain types for generation work in the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::Item;

/// Unique identifier for a job, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current status of a job in its lifecycle.
///
/// `Queued -> Running -> {Complete | Failed}`. A failed job with retries
/// left goes back to `Queued`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting for a worker.
    #[default]
    Queued,
    /// Job is currently being executed by a worker.
    Running {
        started_at: DateTime<Utc>,
        worker_id: String,
    },
    /// Job completed successfully.
    Complete {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: JobResult,
    },
    /// Job failed with an error.
    Failed {
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
        error: String,
        attempts: u32,
    },
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete { .. } | JobStatus::Failed { .. })
    }

    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running { .. } => "running",
            JobStatus::Complete { .. } => "complete",
            JobStatus::Failed { .. } => "failed",
        }
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Human-readable summary of the result.
    pub summary: String,
    /// Optional structured output data as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl JobResult {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            output: None,
        }
    }

    pub fn with_output(summary: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            summary: summary.into(),
            output: Some(output),
        }
    }
}

/// A unit of work executed by a queue worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier for this job.
    pub id: JobId,
    /// Name of the task (used for routing to handlers).
    pub task_name: String,
    /// Task arguments as JSON.
    pub payload: serde_json::Value,
    /// Jobs sharing a key are not run concurrently; a second submit while
    /// one is in flight returns the existing job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
    /// Current status.
    pub status: JobStatus,
    /// Number of attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Timeout in seconds for job execution.
    pub timeout_secs: u64,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job.
    pub fn new(task_name: impl Into<String>, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            task_name: task_name.into(),
            payload,
            dedup_key: None,
            status: JobStatus::Queued,
            attempts: 0,
            max_retries: 0,
            timeout_secs: 60,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the dedup key for this job.
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }

    /// Set the max retries for this job.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the timeout for this job.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Status of a job as seen by a polling caller.
///
/// Serializes as `{"status": "..."}`, plus `"result"` once complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobPoll {
    Queued,
    Running,
    Complete { result: Item },
    Failed,
    NotFound,
}

impl JobPoll {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPoll::Queued => "queued",
            JobPoll::Running => "running",
            JobPoll::Complete { .. } => "complete",
            JobPoll::Failed => "failed",
            JobPoll::NotFound => "not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemId, ParentPair};

    #[test]
    fn job_id_parse_round_trips_display() {
        let id = JobId::new();
        assert_eq!(JobId::parse(&id.to_string()).unwrap(), id);
        assert!(JobId::parse("not-a-ulid").is_err());
    }

    #[test]
    fn new_job_is_queued() {
        let job = Job::new("generate_item", serde_json::json!({"prompt": "Fire + Water"}))
            .with_dedup_key("1+2")
            .with_timeout(5);
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!job.status.is_terminal());
        assert_eq!(job.dedup_key.as_deref(), Some("1+2"));
        assert_eq!(job.timeout_secs, 5);
        assert_eq!(job.attempts, 0);
    }

    #[test]
    fn terminal_states() {
        let now = Utc::now();
        let complete = JobStatus::Complete {
            started_at: now,
            completed_at: now,
            result: JobResult::new("done"),
        };
        let failed = JobStatus::Failed {
            started_at: now,
            failed_at: now,
            error: "boom".into(),
            attempts: 1,
        };
        assert!(complete.is_terminal());
        assert!(failed.is_terminal());
        assert_eq!(complete.as_str(), "complete");
        assert_eq!(failed.as_str(), "failed");
    }

    #[test]
    fn poll_wire_shape() {
        let pending = serde_json::to_value(JobPoll::Running).unwrap();
        assert_eq!(pending, serde_json::json!({"status": "running"}));

        let missing = serde_json::to_value(JobPoll::NotFound).unwrap();
        assert_eq!(missing, serde_json::json!({"status": "not_found"}));

        let item = Item::new("💨", "Steam")
            .with_id(ItemId(5))
            .with_parents(vec![ParentPair::new(ItemId(1), ItemId(2))]);
        let done = serde_json::to_value(JobPoll::Complete { result: item }).unwrap();
        assert_eq!(done["status"], "complete");
        assert_eq!(done["result"]["emoji"], "💨");
        assert_eq!(done["result"]["text"], "Steam");
    }
}
