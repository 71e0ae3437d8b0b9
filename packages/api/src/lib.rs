//! Game backend: resolves item pairs, generating unseen combinations in the
//! background.
//!
//! - [`Resolver`] - cached lookup, else submit a generation job
//! - [`GenerateItemHandler`] - worker side: call the model, store the item
//! - [`routes::router`] - axum routes for the game client
//! - [`init_app`] - connect, seed and start workers from an [`AppConfig`]

mod context;
mod error;
mod resolve;
pub mod routes;
pub mod seed;
mod worker;

pub use context::{AppConfig, AppContext, init_app};
pub use error::{InitError, ResolveError, json_error};
pub use resolve::{Resolution, Resolver};
pub use worker::{GENERATE_ITEM, GenerateItemHandler, GenerationTask, generate_item};
