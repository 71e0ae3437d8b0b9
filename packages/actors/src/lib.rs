//! Actor system for background jobs.
//!
//! # Architecture
//!
//! - `Coordinator` - Cloneable handle: submit jobs, poll their status, shut down
//! - `QueueActor` - Owns every job: FIFO dispatch, dedup, retries and expiry
//! - `WorkerActor` - Pulls jobs from the queue and runs the matching handler
//!
//! # Usage
//!
//! ```ignore
//! use actors::{Coordinator, CoordinatorConfig, JobHandlerRegistry};
//!
//! let coordinator = Coordinator::start(CoordinatorConfig::default(), handlers).await?;
//! let job_id = coordinator.submit("generate_item", payload, Some("1+2".into())).await?;
//! let status = coordinator.poll(&job_id.to_string()).await?;
//! ```

mod coordinator;
mod handler;
mod messages;
mod queue_actor;
mod worker_actor;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use handler::{FnHandler, HandlerFuture, HandlerResult, JobHandler, JobHandlerRegistry};
pub use messages::{CoordinatorError, QueueMessage, QueueStats, WorkerMessage};
pub use queue_actor::{QueueActor, QueueSettings};
pub use worker_actor::WorkerActor;
