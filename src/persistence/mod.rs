//! Persistence layer: read-only access to the analytical store.
//!
//! Provides the [`QueryExecutor`] trait for running one validated
//! statement and reducing it to an integer. The concrete implementation
//! uses `sqlx::PgPool` for async PostgreSQL access.

pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::GeneratedStatement;

pub use postgres::PostgresExecutor;

/// Failure while running a statement. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The engine, driver, or pool reported an error.
    #[error("{0}")]
    Database(String),

    /// The statement ran past the execution bound and was cancelled.
    #[error("query exceeded {0:?}")]
    Timeout(Duration),

    /// The result set was not one row of one numeric column.
    #[error("unexpected result shape: {0}")]
    Shape(String),
}

impl From<sqlx::Error> for ExecutionError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => Self::Database(db.message().to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Runs one validated statement and returns its scalar.
#[async_trait]
pub trait QueryExecutor: Send + Sync + std::fmt::Debug {
    /// Executes `statement`, coercing a `NULL` or empty result to `0`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] on database failure, timeout, or a
    /// result that is not a single numeric scalar.
    async fn execute(&self, statement: &GeneratedStatement) -> Result<i64, ExecutionError>;
}
