//! Database schema definitions using SurrealQL.

use crate::connection::check;
use crate::{Database, DbError};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes. Every definition
/// is `IF NOT EXISTS`, so running it against an existing database is a no-op.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    check(db.client().query(ITEM_SCHEMA).await?)?;
    check(db.client().query(PARENT_SCHEMA).await?)?;
    check(db.client().query(COUNTER_SCHEMA).await?)?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Item table schema. Record ids are integers: `item:1`, `item:2`, ...
const ITEM_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS item SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS emoji ON item TYPE string ASSERT string::len($value) > 0;
DEFINE FIELD IF NOT EXISTS text ON item TYPE string ASSERT string::len($value) > 0;
"#;

/// Parent pair table schema.
///
/// `first <= second` is guaranteed by `ParentPair` on every write path.
/// The `(first, second)` index keeps a pair from resolving to two items.
const PARENT_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS parent SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS first ON parent TYPE int ASSERT $value >= 0;
DEFINE FIELD IF NOT EXISTS second ON parent TYPE int ASSERT $value >= 0;
DEFINE FIELD IF NOT EXISTS item_id ON parent TYPE int ASSERT $value >= 0;

DEFINE INDEX IF NOT EXISTS parent_owner_pair ON parent FIELDS item_id, first, second UNIQUE;
DEFINE INDEX IF NOT EXISTS parent_pair ON parent FIELDS first, second UNIQUE;
DEFINE INDEX IF NOT EXISTS parent_item ON parent FIELDS item_id;
"#;

/// Id sequence for items.
const COUNTER_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS counter SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS value ON counter TYPE int DEFAULT 0;
"#;
