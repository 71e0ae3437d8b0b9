use db::repositories::ItemRepository;
use db::{DbConfig, DbError};

/// Fresh in-memory store with the schema applied.
///
/// Each call gets its own database so tests can run in parallel.
pub async fn setup_store() -> Result<ItemRepository, DbError> {
    let config = DbConfig::memory().with_database(format!("test_{}", ulid::Ulid::new()));
    let db = db::init(config).await?;
    Ok(ItemRepository::new(db))
}
