//! SurrealDB integration for the item store.
//!
//! This crate provides database connectivity and the repository that
//! persists items and the parent pairs that produce them.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage
//! - `remote`: Connect to a SurrealDB server over websockets

mod connection;
mod schema;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError};
pub use schema::init_schema;

/// Connect to the database and make sure the schema exists.
///
/// This should be called once at application startup; the returned handle
/// is cheap to clone and shared by every request and worker.
pub async fn init(config: DbConfig) -> Result<Database, DbError> {
    let db = Database::connect(config).await?;
    init_schema(&db).await?;
    Ok(db)
}
