//! PostgreSQL access for the books service.
//!
//! Handlers talk to the [`Database`] trait; [`PgDatabase`] implements it on top of a
//! `deadpool-postgres` pool built once at startup.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use books_kernel::settings::DatabaseSettings;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

pub mod error;
pub mod params;
pub mod row;

pub use error::DbError;
pub use params::{bind_named, NamedParams, ParamValue};
pub use row::Row;

/// Executes parameterized SQL and returns decoded rows.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run one statement. `sql` names its parameters as `:name`.
    async fn execute(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, DbError>;
}

/// Pooled PostgreSQL client.
#[derive(Clone)]
pub struct PgDatabase {
    pool: Pool,
    query_timeout: Duration,
}

impl PgDatabase {
    /// Build the pool from settings. Connections are opened lazily on first checkout.
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let pg_config = tokio_postgres::Config::from_str(&settings.url)
            .map_err(|e| DbError::Config(format!("invalid connection string: {e}")))?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(settings.max_connections)
            .build()
            .map_err(|e| DbError::Config(format!("failed to create Postgres pool: {e}")))?;

        tracing::info!(
            target: "books-db",
            max_connections = settings.max_connections,
            query_timeout_ms = settings.query_timeout_ms,
            "database pool created"
        );

        Ok(Self {
            pool,
            query_timeout: Duration::from_millis(settings.query_timeout_ms),
        })
    }

    #[cfg(test)]
    fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn run(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, DbError> {
        let bound = bind_named(sql, params)?;
        // Dropping the client returns the connection to the pool.
        let client = self.pool.get().await?;
        let statement = client.prepare_cached(&bound.sql).await?;
        let rows = client.query(&statement, &bound.as_refs()).await?;
        rows.iter().map(Row::from_postgres).collect()
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn execute(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, DbError> {
        match tokio::time::timeout(self.query_timeout, self.run(sql, params)).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout(self.query_timeout)),
        }
    }
}
