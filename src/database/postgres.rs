use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::info;

use super::{DataStore, DatabaseError};
use crate::config::DatabaseConfig;

/// [`DataStore`] backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgDataStore {
    pool: PgPool,
}

impl PgDataStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.clone()),
            other => query.bind(other.clone()),
        };
    }
    query
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, DatabaseError> {
        // CTE form also accepts INSERT/UPDATE/DELETE ... RETURNING
        let wrapped = format!("WITH t AS ({}) SELECT row_to_json(t) AS row FROM t", sql);
        let rows = bind_params(sqlx::query(&wrapped), params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<Value, _>("row")
                    .map_err(|e| DatabaseError::QueryError(format!("could not decode row: {}", e)))
            })
            .collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        let result = bind_params(sqlx::query(sql), params).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
