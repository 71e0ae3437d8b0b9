//! Background handler that invents the item for an unseen pair.

use std::sync::Arc;

use actors::{HandlerFuture, HandlerResult, JobHandler};
use combo_core::{Item, Job, JobResult, ParentPair, is_failure_sentinel, split_glyph};
use db::repositories::ItemRepository;
use llm::Generator;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Task name for item generation jobs.
pub const GENERATE_ITEM: &str = "generate_item";

/// Payload of a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    /// `"<first text> + <second text>"`.
    pub prompt: String,
    /// Pair the new item is stored under.
    pub pair: ParentPair,
}

impl GenerationTask {
    /// Job payload for this task.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "prompt": self.prompt,
            "pair": self.pair,
        })
    }
}

/// Runs [`generate_item`] for every `generate_item` job.
pub struct GenerateItemHandler<G> {
    generator: Arc<G>,
    store: ItemRepository,
}

impl<G: Generator> GenerateItemHandler<G> {
    pub fn new(generator: Arc<G>, store: ItemRepository) -> Self {
        Self { generator, store }
    }
}

impl<G: Generator> JobHandler for GenerateItemHandler<G> {
    fn task_name(&self) -> &str {
        GENERATE_ITEM
    }

    fn handle(&self, job: &Job) -> HandlerFuture {
        let generator = self.generator.clone();
        let store = self.store.clone();
        let payload = job.payload.clone();

        Box::pin(async move { run(generator.as_ref(), &store, payload).await })
    }
}

async fn run<G: Generator>(
    generator: &G,
    store: &ItemRepository,
    payload: serde_json::Value,
) -> HandlerResult {
    let task: GenerationTask = serde_json::from_value(payload)
        .map_err(|e| format!("Malformed generation task: {}", e))?;
    let item = generate_item(generator, store, &task)
        .await
        .map_err(|e| e.to_string())?;
    let output = serde_json::to_value(&item).map_err(|e| e.to_string())?;
    Ok(JobResult::with_output(
        format!("{} {}", item.emoji, item.text),
        output,
    ))
}

/// Ask the generator for the combination and store it under the task's pair.
///
/// The model's refusal sentinel and unparseable output fail without writing.
/// If the pair was stored by someone else in the meantime, that item is
/// returned instead.
pub async fn generate_item<G: Generator>(
    generator: &G,
    store: &ItemRepository,
    task: &GenerationTask,
) -> Result<Item, ResolveError> {
    tracing::info!("Generating {} for {}", task.prompt, task.pair);

    let raw = generator.generate(&task.prompt).await?;
    let (emoji, text) = split_glyph(&raw);
    if is_failure_sentinel(&emoji, &text) {
        return Err(ResolveError::GenerationUnavailable(format!(
            "model could not combine {}",
            task.prompt
        )));
    }

    match store.add_item(&emoji, &text, &[task.pair]).await {
        Ok(id) => {
            tracing::info!("{} = {} {} (item {})", task.prompt, emoji, text, id);
            Ok(Item::new(emoji, text)
                .with_id(id)
                .with_parents(vec![task.pair]))
        }
        Err(db::DbError::ConstraintViolation(message)) => {
            match store.get_item_by_pair(task.pair.first, task.pair.second).await? {
                Some(existing) => {
                    tracing::debug!("Pair {} was stored concurrently", task.pair);
                    Ok(existing)
                }
                None => Err(ResolveError::ConstraintViolation(message)),
            }
        }
        Err(e) => Err(e.into()),
    }
}
