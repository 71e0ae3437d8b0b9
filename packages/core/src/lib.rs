//! Core domain types for the combination game.
//!
//! This crate contains shared types used across all packages:
//! - Item, ItemId and ParentPair for discovered combinations
//! - Job and JobStatus for generation work in the queue
//! - Glyph splitting for raw generator output

mod glyph;
mod item;
mod job;

pub use glyph::{FAILURE_GLYPH, FAILURE_TEXT, is_failure_sentinel, split_glyph};
pub use item::{Item, ItemId, ParentPair, ValidationError, canonicalize};
pub use job::{Job, JobId, JobPoll, JobResult, JobStatus};
