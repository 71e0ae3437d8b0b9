//! Worker actor for executing jobs.

use std::sync::Arc;
use std::time::Duration;

use combo_core::Job;
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::handler::{HandlerResult, JobHandlerRegistry};
use crate::messages::{QueueMessage, WorkerMessage};

/// State for the worker actor.
pub struct WorkerActorState {
    pub worker_id: String,
    /// Job being processed, if any.
    pub current_job: Option<Job>,
    pub queue: ActorRef<QueueMessage>,
    pub handlers: Arc<JobHandlerRegistry>,
    /// Cleared on shutdown so queued heartbeats stop pulling work.
    pub running: bool,
}

impl WorkerActorState {
    pub fn is_idle(&self) -> bool {
        self.current_job.is_none()
    }

    /// Run one job to completion and report the outcome to the queue.
    async fn process(&mut self, job: Job) -> Result<(), ActorProcessingErr> {
        let job_id = job.id;
        self.current_job = Some(job.clone());

        let outcome = match self.handlers.get(&job.task_name) {
            Some(handler) => {
                let timeout = Duration::from_secs(job.timeout_secs);
                match tokio::time::timeout(timeout, handler.handle(&job)).await {
                    Ok(result) => result,
                    Err(_) => Err(format!("Job timed out after {}s", job.timeout_secs)),
                }
            }
            None => Err(format!("No handler for task: {}", job.task_name)),
        };

        self.current_job = None;
        self.report(job_id, outcome)
    }

    fn report(
        &self,
        job_id: combo_core::JobId,
        outcome: HandlerResult,
    ) -> Result<(), ActorProcessingErr> {
        let message = match outcome {
            Ok(result) => QueueMessage::JobCompleted {
                job_id,
                worker_id: self.worker_id.clone(),
                result,
            },
            Err(error) => QueueMessage::JobFailed {
                job_id,
                worker_id: self.worker_id.clone(),
                error,
            },
        };
        self.queue.send_message(message)?;
        Ok(())
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub worker_id: String,
    pub queue: ActorRef<QueueMessage>,
    pub handlers: Arc<JobHandlerRegistry>,
    /// How often an idle worker asks the queue for work.
    pub poll_interval: Duration,
}

/// Worker actor that executes jobs one at a time.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting worker: {}", args.worker_id);

        let poll_interval = args.poll_interval;
        let myself_clone = myself.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            // Don't burst missed ticks after a long job.
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if myself_clone.send_message(WorkerMessage::Heartbeat).is_err() {
                    break;
                }
            }
        });

        Ok(WorkerActorState {
            worker_id: args.worker_id,
            current_job: None,
            queue: args.queue,
            handlers: args.handlers,
            running: true,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Heartbeat => {
                if !state.running || !state.is_idle() {
                    return Ok(());
                }

                let result = ractor::rpc::call(
                    &state.queue,
                    |reply| QueueMessage::RequestJob {
                        worker_id: state.worker_id.clone(),
                        reply,
                    },
                    Some(Duration::from_secs(5)),
                )
                .await;

                if let Ok(ractor::rpc::CallResult::Success(Some(job))) = result {
                    state.process(job).await?;
                }
            }

            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down worker: {}", state.worker_id);
                state.running = false;
                myself.stop(None);
            }
        }

        Ok(())
    }
}
