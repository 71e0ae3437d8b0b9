//! Chat-completion client used to invent new combinations.
//!
//! [`ChatClient`] talks to any OpenAI-compatible `/chat/completions`
//! endpoint. Callers depend on the [`Generator`] trait so tests can swap in
//! a scripted backend.

pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

pub use client::{ChatClient, ChatConfig, SYSTEM_PROMPT};
pub use error::GenerationError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice, ChoiceMessage};

/// A text-generation backend.
///
/// `generate` returns the raw model text; it does not parse or validate it.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self, prompt: &str)
    -> impl Future<Output = Result<String, GenerationError>> + Send;
}
