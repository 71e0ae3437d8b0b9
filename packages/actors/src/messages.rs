//! Message types for actor communication.

use combo_core::{Job, JobId, JobResult};
use ractor::RpcReplyPort;
use serde::{Deserialize, Serialize};

/// Messages for the QueueActor.
#[derive(Debug)]
pub enum QueueMessage {
    /// Enqueue a new job. If another job with the same dedup key is still
    /// queued or running, that job is returned instead.
    Enqueue {
        job: Box<Job>,
        reply: RpcReplyPort<Result<Job, String>>,
    },

    /// Request the next job for a worker.
    RequestJob {
        worker_id: String,
        reply: RpcReplyPort<Option<Job>>,
    },

    /// Report job completion.
    JobCompleted {
        job_id: JobId,
        worker_id: String,
        result: JobResult,
    },

    /// Report job failure.
    JobFailed {
        job_id: JobId,
        worker_id: String,
        error: String,
    },

    /// Get a job by ID.
    GetJob {
        job_id: JobId,
        reply: RpcReplyPort<Option<Job>>,
    },

    /// Get queue counters.
    GetStats { reply: RpcReplyPort<QueueStats> },

    /// Shutdown the queue.
    Shutdown,

    /// Periodic tick for housekeeping.
    Tick,
}

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Poll the queue for work when idle.
    Heartbeat,

    /// Shutdown the worker once the current job is done.
    Shutdown,
}

/// Snapshot of the queue's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queued: u64,
    pub running: u64,
    /// Jobs completed since start.
    pub completed: u64,
    /// Jobs failed for good since start.
    pub failed: u64,
    /// Jobs still held in memory, including finished ones awaiting expiry.
    pub tracked: u64,
}

/// Errors surfaced by the [`Coordinator`](crate::Coordinator).
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Failed to start actors: {0}")]
    Spawn(String),

    #[error("Queue rejected job: {0}")]
    Rejected(String),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,
}
