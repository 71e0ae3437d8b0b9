//! Database connection management.

use combo_core::ValidationError;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use thiserror::Error;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Connection endpoint: "mem://", "rocksdb://path" or "ws://host:port"
    pub endpoint: String,
    /// Namespace to use
    pub namespace: String,
    /// Database name to use
    pub database: String,
    /// Optional root credentials for authentication
    pub credentials: Option<(String, String)>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "combinario".to_string(),
            database: "main".to_string(),
            credentials: None,
        }
    }
}

impl DbConfig {
    /// Create a config for in-memory testing.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a config for an explicit endpoint.
    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Create a config for RocksDB persistence (requires rocksdb feature).
    pub fn rocksdb(path: impl Into<String>) -> Self {
        Self::endpoint(format!("rocksdb://{}", path.into()))
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set root credentials for authentication.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    /// A transaction lost a read/write race and may be run again.
    #[error("Transaction conflict: {0}")]
    Conflict(String),
    #[error("Invalid item: {0}")]
    Validation(#[from] ValidationError),
    #[error("Query error: {0}")]
    Query(String),
}

impl DbError {
    /// Classify a raw SurrealDB error message.
    pub(crate) fn from_message(message: String) -> Self {
        if is_unique_violation(&message) {
            DbError::ConstraintViolation(message)
        } else if is_retryable_conflict(&message) {
            DbError::Conflict(message)
        } else {
            DbError::StorageUnavailable(message)
        }
    }
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        DbError::from_message(err.to_string())
    }
}

fn is_unique_violation(message: &str) -> bool {
    message.contains("already contains") || message.contains("already exists")
}

fn is_retryable_conflict(message: &str) -> bool {
    message.contains("can be retried") || message.contains("read or write conflict")
}

/// Shared handle to the database.
///
/// Cloning is cheap; all clones share one underlying connection.
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
}

impl Database {
    /// Open a connection and select the configured namespace and database.
    pub async fn connect(config: DbConfig) -> Result<Self, DbError> {
        tracing::info!("Connecting to database: {}", config.endpoint);

        let client = connect(&config.endpoint).await?;

        // Authenticate if credentials provided
        if let Some((username, password)) = &config.credentials {
            client
                .signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await?;
        }

        client
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        tracing::info!(
            "Connected to database: {}/{}",
            config.namespace,
            config.database
        );

        Ok(Self { client })
    }

    /// Underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.client
    }

    /// Check that the database answers.
    pub async fn health(&self) -> Result<(), DbError> {
        self.client.health().await?;
        Ok(())
    }
}

/// Surface statement-level errors from a query response.
///
/// Statement errors only show up on the response, so they are collected
/// here; a unique-index failure anywhere in the batch wins over the
/// generic "not executed due to a failed transaction" errors it causes.
pub(crate) fn check(mut response: surrealdb::Response) -> Result<surrealdb::Response, DbError> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }

    let mut messages: Vec<(usize, String)> = errors
        .into_iter()
        .map(|(idx, err)| (idx, err.to_string()))
        .collect();
    messages.sort_by_key(|(idx, _)| *idx);

    if let Some((_, message)) = messages.iter().find(|(_, m)| is_unique_violation(m)) {
        return Err(DbError::ConstraintViolation(message.clone()));
    }

    let joined = messages
        .into_iter()
        .map(|(_, m)| m)
        .collect::<Vec<_>>()
        .join("; ");
    Err(DbError::from_message(joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unique_index_errors() {
        let err = DbError::from_message(
            "Database index `parent_pair` already contains [1, 2], with record `parent:abc`"
                .to_string(),
        );
        assert!(matches!(err, DbError::ConstraintViolation(_)));

        let err = DbError::from_message("There was a problem with the connection".to_string());
        assert!(matches!(err, DbError::StorageUnavailable(_)));
    }

    #[test]
    fn classifies_commit_conflicts_as_retryable() {
        let err = DbError::from_message(
            "The query was not executed due to a failed transaction. Failed to commit \
             transaction due to a read or write conflict. This transaction can be retried"
                .to_string(),
        );
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn config_builders() {
        let config = DbConfig::endpoint("ws://localhost:8000")
            .with_namespace("game")
            .with_database("test")
            .with_credentials("root", "secret");
        assert_eq!(config.endpoint, "ws://localhost:8000");
        assert_eq!(config.namespace, "game");
        assert_eq!(config.database, "test");
        assert_eq!(
            config.credentials,
            Some(("root".to_string(), "secret".to_string()))
        );
        assert_eq!(DbConfig::rocksdb("./data").endpoint, "rocksdb://./data");
    }
}
