//! Queue actor holding every job the coordinator knows about.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::Utc;
use combo_core::{Job, JobId, JobStatus};
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::messages::{QueueMessage, QueueStats};

/// Settings for the queue actor.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// How long finished jobs stay pollable.
    pub retention: Duration,
    /// Interval between housekeeping ticks.
    pub tick_interval: Duration,
    /// Extra time past a job's own timeout before a running job is
    /// considered abandoned by its worker.
    pub stale_grace: Duration,
    /// Reject new jobs once this many are waiting.
    pub max_pending: Option<usize>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(3600),
            tick_interval: Duration::from_secs(30),
            stale_grace: Duration::from_secs(30),
            max_pending: None,
        }
    }
}

/// State for the queue actor.
pub struct QueueActorState {
    settings: QueueSettings,
    /// Waiting jobs in arrival order.
    pending: VecDeque<JobId>,
    /// Running jobs and the worker that holds each.
    running: HashMap<JobId, String>,
    /// All jobs by ID, terminal ones included until they expire.
    jobs: HashMap<JobId, Job>,
    /// Dedup key to the job currently queued or running for it.
    in_flight: HashMap<String, JobId>,
    completed: u64,
    failed: u64,
}

impl QueueActorState {
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            settings,
            pending: VecDeque::new(),
            running: HashMap::new(),
            jobs: HashMap::new(),
            in_flight: HashMap::new(),
            completed: 0,
            failed: 0,
        }
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.pending.len() as u64,
            running: self.running.len() as u64,
            completed: self.completed,
            failed: self.failed,
            tracked: self.jobs.len() as u64,
        }
    }

    /// Job already in flight for this key, if any.
    fn in_flight_for(&self, key: &str) -> Option<&Job> {
        let id = self.in_flight.get(key)?;
        self.jobs.get(id).filter(|job| !job.status.is_terminal())
    }

    fn enqueue(&mut self, job: Job) -> Result<Job, String> {
        if let Some(key) = job.dedup_key.as_deref()
            && let Some(existing) = self.in_flight_for(key)
        {
            tracing::debug!("Job for {} already in flight as {}", key, existing.id);
            return Ok(existing.clone());
        }

        if let Some(max) = self.settings.max_pending
            && self.pending.len() >= max
        {
            return Err("Queue is full".into());
        }

        if let Some(key) = job.dedup_key.clone() {
            self.in_flight.insert(key, job.id);
        }
        self.pending.push_back(job.id);
        self.jobs.insert(job.id, job.clone());

        tracing::info!("Job {} ({}) queued", job.id, job.task_name);
        Ok(job)
    }

    fn next_job(&mut self, worker_id: &str) -> Option<Job> {
        // Skip ids whose job has since expired.
        while let Some(job_id) = self.pending.pop_front() {
            let Some(job) = self.jobs.get_mut(&job_id) else {
                continue;
            };

            let now = Utc::now();
            job.attempts = job.attempts.saturating_add(1);
            job.status = JobStatus::Running {
                started_at: now,
                worker_id: worker_id.to_string(),
            };
            job.updated_at = now;

            self.running.insert(job_id, worker_id.to_string());
            tracing::info!(
                "Job {} running on {} (attempt {})",
                job_id,
                worker_id,
                job.attempts
            );
            return Some(job.clone());
        }
        None
    }

    fn complete(&mut self, job_id: JobId, result: combo_core::JobResult) {
        if self.running.remove(&job_id).is_none() {
            tracing::warn!("Completion for job {} which is not running", job_id);
            return;
        }
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };

        let now = Utc::now();
        let started_at = started_at(&job.status).unwrap_or(now);
        let duration_ms = (now - started_at).num_milliseconds();
        job.status = JobStatus::Complete {
            started_at,
            completed_at: now,
            result,
        };
        job.updated_at = now;
        self.completed += 1;

        tracing::info!("Job {} complete in {}ms", job_id, duration_ms);
        let key = job.dedup_key.clone();
        self.release(key, job_id);
    }

    fn fail(&mut self, job_id: JobId, error: String) {
        if self.running.remove(&job_id).is_none() {
            tracing::warn!("Failure for job {} which is not running", job_id);
            return;
        }
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };

        let now = Utc::now();
        let attempts = job.attempts;
        job.updated_at = now;

        if attempts <= job.max_retries {
            tracing::warn!(
                "Job {} failed (attempt {}), retrying: {}",
                job_id,
                attempts,
                error
            );
            job.status = JobStatus::Queued;
            self.pending.push_back(job_id);
            return;
        }

        tracing::warn!("Job {} failed after {} attempt(s): {}", job_id, attempts, error);
        job.status = JobStatus::Failed {
            started_at: started_at(&job.status).unwrap_or(now),
            failed_at: now,
            error,
            attempts,
        };
        self.failed += 1;
        let key = job.dedup_key.clone();
        self.release(key, job_id);
    }

    fn release(&mut self, key: Option<String>, job_id: JobId) {
        if let Some(key) = key
            && self.in_flight.get(&key) == Some(&job_id)
        {
            self.in_flight.remove(&key);
        }
    }

    /// Fail running jobs whose worker stopped reporting and drop finished
    /// jobs older than the retention window.
    fn housekeeping(&mut self) {
        let now = Utc::now();

        let stale: Vec<JobId> = self
            .running
            .keys()
            .filter(|id| {
                self.jobs.get(id).is_some_and(|job| {
                    let limit = Duration::from_secs(job.timeout_secs) + self.settings.stale_grace;
                    started_at(&job.status).is_some_and(|started| {
                        (now - started).to_std().is_ok_and(|elapsed| elapsed > limit)
                    })
                })
            })
            .copied()
            .collect();
        for job_id in stale {
            self.fail(job_id, "Worker stopped responding".into());
        }

        let retention = self.settings.retention;
        let before = self.jobs.len();
        self.jobs.retain(|_, job| {
            !job.status.is_terminal()
                || (now - job.updated_at).to_std().unwrap_or_default() < retention
        });
        let expired = before - self.jobs.len();
        if expired > 0 {
            tracing::debug!("Expired {} finished job(s)", expired);
        }
    }
}

fn started_at(status: &JobStatus) -> Option<chrono::DateTime<Utc>> {
    match status {
        JobStatus::Running { started_at, .. }
        | JobStatus::Complete { started_at, .. }
        | JobStatus::Failed { started_at, .. } => Some(*started_at),
        JobStatus::Queued => None,
    }
}

/// Queue actor: FIFO dispatch, job bookkeeping and expiry.
pub struct QueueActor;

impl Actor for QueueActor {
    type Msg = QueueMessage;
    type State = QueueActorState;
    type Arguments = QueueSettings;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting queue actor");

        let tick = args.tick_interval;
        let myself_clone = myself.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                if myself_clone.send_message(QueueMessage::Tick).is_err() {
                    break;
                }
            }
        });

        Ok(QueueActorState::new(args))
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::Enqueue { job, reply } => {
                let _ = reply.send(state.enqueue(*job));
            }

            QueueMessage::RequestJob { worker_id, reply } => {
                let _ = reply.send(state.next_job(&worker_id));
            }

            QueueMessage::JobCompleted {
                job_id,
                worker_id: _,
                result,
            } => state.complete(job_id, result),

            QueueMessage::JobFailed {
                job_id,
                worker_id: _,
                error,
            } => state.fail(job_id, error),

            QueueMessage::GetJob { job_id, reply } => {
                let _ = reply.send(state.jobs.get(&job_id).cloned());
            }

            QueueMessage::GetStats { reply } => {
                let _ = reply.send(state.stats());
            }

            QueueMessage::Shutdown => {
                let stats = state.stats();
                tracing::info!(
                    "Shutting down queue ({} queued, {} running)",
                    stats.queued,
                    stats.running
                );
                myself.stop(None);
            }

            QueueMessage::Tick => state.housekeeping(),
        }

        Ok(())
    }
}
