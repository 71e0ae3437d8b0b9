#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::CoordinatorConfig;
use api::AppContext;
use api::seed::prepopulate;
use db::repositories::ItemRepository;
use db::{DbConfig, DbError};
use llm::{GenerationError, Generator};
use tokio::sync::Semaphore;

/// Generator that replays a fixed answer and records every prompt.
#[derive(Clone)]
pub struct ScriptedGenerator {
    reply: Result<String, u16>,
    prompts: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Arc::default(),
            gate: None,
        }
    }

    /// Always fails as if the backend answered with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            prompts: Arc::default(),
            gate: None,
        }
    }

    /// Hold every call until a permit is added to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(GenerationError::Api {
                status: *status,
                message: "scripted failure".into(),
            }),
        }
    }
}

pub async fn setup_store() -> Result<ItemRepository, DbError> {
    let config = DbConfig::memory().with_database(format!("test_{}", combo_core::JobId::new()));
    let store = ItemRepository::new(db::init(config).await?);
    prepopulate(&store).await?;
    Ok(store)
}

pub fn test_config() -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_workers(2)
        .with_job_timeout(5)
        .with_poll_interval(Duration::from_millis(10))
}

pub async fn setup(generator: ScriptedGenerator) -> AppContext {
    let store = setup_store().await.unwrap();
    AppContext::start(store, generator, test_config()).await.unwrap()
}
