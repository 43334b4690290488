pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use postgres::PgDataStore;

/// Errors from the data store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Narrow data access interface used by the resource handlers.
///
/// Parameters are positional (`$1`, `$2`, ...) JSON scalars; rows come back as
/// JSON objects keyed by column name.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, DatabaseError>;

    /// Run a statement and return the number of affected rows
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
