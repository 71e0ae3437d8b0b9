//! Resolution workflow: cached lookup, else dispatch a generation job.

use actors::Coordinator;
use combo_core::{Item, ItemId, JobId, JobPoll, canonicalize};
use db::repositories::ItemRepository;

use crate::error::ResolveError;
use crate::worker::{GENERATE_ITEM, GenerationTask};

/// Outcome of resolving a pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The pair already produces this item.
    Item(Item),
    /// A generation job was submitted (or was already running) for the pair.
    Pending(JobId),
}

/// Resolves pairs against the store and hands misses to the coordinator.
#[derive(Clone)]
pub struct Resolver {
    store: ItemRepository,
    coordinator: Coordinator,
}

impl Resolver {
    pub fn new(store: ItemRepository, coordinator: Coordinator) -> Self {
        Self { store, coordinator }
    }

    pub async fn resolve(&self, first: i64, second: i64) -> Result<Resolution, ResolveError> {
        let pair = canonicalize(first, second)?;

        if let Some(item) = self.store.get_item_by_pair(pair.first, pair.second).await? {
            tracing::debug!("Pair {} resolved to item {:?}", pair, item.id);
            return Ok(Resolution::Item(item));
        }

        // Prompt keeps the order the player combined them in.
        let a = self.parent(ItemId(first)).await?;
        let b = self.parent(ItemId(second)).await?;
        let task = GenerationTask {
            prompt: format!("{} + {}", a.text, b.text),
            pair,
        };

        let job_id = self
            .coordinator
            .submit(GENERATE_ITEM, task.to_payload(), Some(pair.key()))
            .await?;

        tracing::info!("Pair {} ({}) pending as job {}", pair, task.prompt, job_id);
        Ok(Resolution::Pending(job_id))
    }

    pub async fn poll_job(&self, job_id: &str) -> Result<JobPoll, ResolveError> {
        Ok(self.coordinator.poll(job_id).await?)
    }

    async fn parent(&self, id: ItemId) -> Result<Item, ResolveError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(ResolveError::NotFound(id))
    }
}
