//! Coordinator: the handle callers use to submit and poll jobs.

use std::sync::Arc;
use std::time::Duration;

use combo_core::{Item, Job, JobId, JobPoll, JobStatus};
use ractor::rpc::CallResult;
use ractor::{Actor, ActorRef};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::handler::JobHandlerRegistry;
use crate::messages::{CoordinatorError, QueueMessage, QueueStats, WorkerMessage};
use crate::queue_actor::{QueueActor, QueueSettings};
use crate::worker_actor::{WorkerActor, WorkerArgs};

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Number of worker actors.
    pub workers: usize,
    /// Per-job execution timeout.
    pub job_timeout_secs: u64,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// How long finished jobs stay pollable.
    pub retention: Duration,
    /// Housekeeping interval of the queue actor.
    pub tick_interval: Duration,
    /// How often idle workers ask for work.
    pub poll_interval: Duration,
    /// Timeout for calls into the queue actor.
    pub call_timeout: Duration,
    /// Reject submits once this many jobs are waiting.
    pub max_pending: Option<usize>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            job_timeout_secs: 60,
            max_retries: 0,
            retention: Duration::from_secs(3600),
            tick_interval: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            call_timeout: Duration::from_secs(5),
            max_pending: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_job_timeout(mut self, secs: u64) -> Self {
        self.job_timeout_secs = secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_pending(mut self, max_pending: Option<usize>) -> Self {
        self.max_pending = max_pending;
        self
    }
}

/// Handle to the running queue and its workers.
///
/// Cloning is cheap; every clone talks to the same actors.
#[derive(Clone)]
pub struct Coordinator {
    queue: ActorRef<QueueMessage>,
    workers: Arc<Vec<ActorRef<WorkerMessage>>>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Spawn the queue actor and `config.workers` workers.
    pub async fn start(
        config: CoordinatorConfig,
        handlers: JobHandlerRegistry,
    ) -> Result<Self, CoordinatorError> {
        tracing::info!(
            "Starting coordinator with {} worker(s) for tasks {:?}",
            config.workers,
            handlers.task_names()
        );

        let settings = QueueSettings {
            retention: config.retention,
            tick_interval: config.tick_interval,
            max_pending: config.max_pending,
            ..Default::default()
        };
        let (queue, queue_handle) = Actor::spawn(None, QueueActor, settings)
            .await
            .map_err(|e| CoordinatorError::Spawn(format!("queue: {}", e)))?;

        let handlers = Arc::new(handlers);
        let mut workers = Vec::with_capacity(config.workers);
        let mut handles = vec![queue_handle];

        for n in 1..=config.workers.max(1) {
            let args = WorkerArgs {
                worker_id: format!("worker-{}", n),
                queue: queue.clone(),
                handlers: handlers.clone(),
                poll_interval: config.poll_interval,
            };
            match Actor::spawn(None, WorkerActor, args).await {
                Ok((worker, handle)) => {
                    workers.push(worker);
                    handles.push(handle);
                }
                Err(e) => {
                    for worker in &workers {
                        worker.stop(None);
                    }
                    queue.stop(None);
                    return Err(CoordinatorError::Spawn(format!("worker-{}: {}", n, e)));
                }
            }
        }

        Ok(Self {
            queue,
            workers: Arc::new(workers),
            handles: Arc::new(Mutex::new(handles)),
            config,
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Enqueue a job and return its id without waiting for it to run.
    ///
    /// With a dedup key, a job already queued or running for the same key
    /// is returned instead of a new one.
    pub async fn submit(
        &self,
        task_name: &str,
        payload: serde_json::Value,
        dedup_key: Option<String>,
    ) -> Result<JobId, CoordinatorError> {
        let mut job = Job::new(task_name, payload)
            .with_max_retries(self.config.max_retries)
            .with_timeout(self.config.job_timeout_secs);
        if let Some(key) = dedup_key {
            job = job.with_dedup_key(key);
        }

        let result = ractor::rpc::call(
            &self.queue,
            |reply| QueueMessage::Enqueue {
                job: Box::new(job),
                reply,
            },
            Some(self.config.call_timeout),
        )
        .await;

        match result {
            Ok(CallResult::Success(Ok(job))) => Ok(job.id),
            Ok(CallResult::Success(Err(reason))) => Err(CoordinatorError::Rejected(reason)),
            Ok(CallResult::Timeout) => Err(CoordinatorError::Timeout),
            Ok(CallResult::SenderError) => {
                Err(CoordinatorError::Unavailable("queue dropped the request".into()))
            }
            Err(e) => Err(CoordinatorError::Unavailable(e.to_string())),
        }
    }

    /// Raw job record, if the queue still holds it.
    pub async fn job(&self, job_id: JobId) -> Result<Option<Job>, CoordinatorError> {
        let result = ractor::rpc::call(
            &self.queue,
            |reply| QueueMessage::GetJob { job_id, reply },
            Some(self.config.call_timeout),
        )
        .await;

        match result {
            Ok(CallResult::Success(job)) => Ok(job),
            Ok(CallResult::Timeout) => Err(CoordinatorError::Timeout),
            Ok(CallResult::SenderError) => {
                Err(CoordinatorError::Unavailable("queue dropped the request".into()))
            }
            Err(e) => Err(CoordinatorError::Unavailable(e.to_string())),
        }
    }

    /// Current status of a job.
    ///
    /// Ids that do not parse, were never issued, or have expired all report
    /// `NotFound`. A completed job whose output is not an item reports
    /// `Failed`.
    pub async fn poll(&self, job_id: &str) -> Result<JobPoll, CoordinatorError> {
        let Ok(job_id) = JobId::parse(job_id) else {
            return Ok(JobPoll::NotFound);
        };

        let Some(job) = self.job(job_id).await? else {
            return Ok(JobPoll::NotFound);
        };

        Ok(match job.status {
            JobStatus::Queued => JobPoll::Queued,
            JobStatus::Running { .. } => JobPoll::Running,
            JobStatus::Failed { .. } => JobPoll::Failed,
            JobStatus::Complete { result, .. } => {
                let decoded = result
                    .output
                    .ok_or_else(|| "no output".to_string())
                    .and_then(|v| serde_json::from_value::<Item>(v).map_err(|e| e.to_string()));
                match decoded {
                    Ok(item) => JobPoll::Complete { result: item },
                    Err(e) => {
                        tracing::warn!("Job {} completed with unreadable result: {}", job_id, e);
                        JobPoll::Failed
                    }
                }
            }
        })
    }

    pub async fn stats(&self) -> Result<QueueStats, CoordinatorError> {
        let result = ractor::rpc::call(
            &self.queue,
            |reply| QueueMessage::GetStats { reply },
            Some(self.config.call_timeout),
        )
        .await;

        match result {
            Ok(CallResult::Success(stats)) => Ok(stats),
            Ok(CallResult::Timeout) => Err(CoordinatorError::Timeout),
            Ok(CallResult::SenderError) => {
                Err(CoordinatorError::Unavailable("queue dropped the request".into()))
            }
            Err(e) => Err(CoordinatorError::Unavailable(e.to_string())),
        }
    }

    /// Stop the workers and the queue.
    ///
    /// Workers finish the job they are running first; waiting stops after
    /// `grace`. Jobs still queued are dropped.
    pub async fn shutdown(&self, grace: Duration) {
        tracing::info!("Shutting down coordinator");

        for worker in self.workers.iter() {
            let _ = worker.send_message(WorkerMessage::Shutdown);
        }

        let mut handles = std::mem::take(&mut *self.handles.lock().await);
        let queue_handle = (!handles.is_empty()).then(|| handles.remove(0));

        let workers_done = async move {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(grace, workers_done).await.is_err() {
            tracing::warn!("Workers still busy after {:?}, stopping anyway", grace);
            for worker in self.workers.iter() {
                worker.stop(None);
            }
        }

        let _ = self.queue.send_message(QueueMessage::Shutdown);
        if let Some(handle) = queue_handle {
            let _ = tokio::time::timeout(grace, handle).await;
        }
    }
}
