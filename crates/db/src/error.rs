use std::time::Duration;

use thiserror::Error;

/// Failures raised by the database access layer.
///
/// A query that matches no rows is not an error; it yields an empty row set.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("query exceeded timeout of {0:?}")]
    Timeout(Duration),

    #[error("SQL references unbound parameter `{0}`")]
    MissingParameter(String),

    #[error("cannot decode column `{column}` of type `{type_name}`")]
    Decode { column: String, type_name: String },

    #[error("configuration error: {0}")]
    Config(String),
}
