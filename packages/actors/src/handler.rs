//! Job handler trait and registry.

use combo_core::{Job, JobResult};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result type for job handlers. The error is recorded on the failed job.
pub type HandlerResult = Result<JobResult, String>;

/// Future type for async job handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Trait for job handlers.
///
/// Implement this trait to define how jobs of a specific task are processed.
pub trait JobHandler: Send + Sync + 'static {
    /// The task name this handler processes.
    fn task_name(&self) -> &str;

    /// Process a job and return the result.
    fn handle(&self, job: &Job) -> HandlerFuture;
}

/// Registry for job handlers, keyed by task name.
#[derive(Default, Clone)]
pub struct JobHandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same task.
    pub fn register<H: JobHandler>(&mut self, handler: H) {
        let task_name = handler.task_name().to_string();
        self.handlers.insert(task_name, Arc::new(handler));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<H: JobHandler>(mut self, handler: H) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, task_name: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(task_name).cloned()
    }

    pub fn has_handler(&self, task_name: &str) -> bool {
        self.handlers.contains_key(task_name)
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }
}

/// A simple function-based job handler.
pub struct FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    task_name: String,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    pub fn new(task_name: impl Into<String>, handler: F) -> Self {
        Self {
            task_name: task_name.into(),
            handler,
        }
    }
}

impl<F> JobHandler for FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    fn task_name(&self) -> &str {
        &self.task_name
    }

    fn handle(&self, job: &Job) -> HandlerFuture {
        (self.handler)(job)
    }
}
