//! Application context shared by every request and worker.

use std::sync::Arc;
use std::time::Duration;

use actors::{Coordinator, CoordinatorConfig, JobHandlerRegistry};
use db::repositories::ItemRepository;
use db::{DbConfig, DbError};
use llm::{ChatClient, ChatConfig, Generator};

use crate::error::InitError;
use crate::resolve::Resolver;
use crate::seed;
use crate::worker::GenerateItemHandler;

/// Everything needed to bring the application up.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub db: DbConfig,
    pub chat: ChatConfig,
    pub coordinator: CoordinatorConfig,
    /// Insert the base elements on startup.
    pub seed: bool,
}

/// Store and coordinator handles, built once at startup.
///
/// Cloning is cheap; clones share the same connection and actors.
#[derive(Clone)]
pub struct AppContext {
    pub store: ItemRepository,
    pub coordinator: Coordinator,
    pub resolver: Resolver,
}

impl AppContext {
    /// Start the coordinator with a generation handler backed by `generator`.
    pub async fn start<G: Generator>(
        store: ItemRepository,
        generator: G,
        config: CoordinatorConfig,
    ) -> Result<Self, InitError> {
        let handlers = JobHandlerRegistry::new()
            .with(GenerateItemHandler::new(Arc::new(generator), store.clone()));
        let coordinator = Coordinator::start(config, handlers).await?;
        let resolver = Resolver::new(store.clone(), coordinator.clone());

        Ok(Self {
            store,
            coordinator,
            resolver,
        })
    }

    pub async fn health(&self) -> Result<(), DbError> {
        self.store.database().health().await
    }

    /// Stop the workers, letting running jobs finish within `grace`.
    pub async fn shutdown(&self, grace: Duration) {
        self.coordinator.shutdown(grace).await;
    }
}

/// Connect the store, optionally seed it, and start the workers.
pub async fn init_app(config: AppConfig) -> Result<AppContext, InitError> {
    tracing::info!("Initializing application...");

    let database = db::init(config.db).await?;
    let store = ItemRepository::new(database);
    if config.seed {
        seed::prepopulate(&store).await?;
    }

    let generator = ChatClient::new(config.chat)?;
    tracing::info!(
        "Using model {} at {}",
        generator.config().model,
        generator.config().base_url
    );

    let ctx = AppContext::start(store, generator, config.coordinator).await?;
    tracing::info!("Application initialized");
    Ok(ctx)
}
