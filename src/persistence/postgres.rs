//! PostgreSQL implementation of the query executor.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row};

use super::{ExecutionError, QueryExecutor};
use crate::domain::{GeneratedStatement, SchemaContract};

/// SQLSTATE `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";

/// A decoded scalar cell.
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    Null,
}

/// PostgreSQL-backed executor using `sqlx::PgPool`.
///
/// Every call borrows one pooled connection, opens a read-only
/// transaction with a `statement_timeout`, runs the statement, and rolls
/// back. The transaction and connection are released when the call's
/// future completes or is dropped.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresExecutor {
    /// Creates an executor over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Connects a bounded pool lazily; no connection is opened until the
    /// first statement runs.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Database`] if the URL cannot be parsed.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, ExecutionError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool, timeout))
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ExecutionError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ExecutionError::Database(e.to_string()))
    }

    /// Lists `table.column` entries of `contract` missing from the store.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Database`] if the catalog cannot be read.
    pub async fn missing_columns(
        &self,
        contract: &SchemaContract,
    ) -> Result<Vec<String>, ExecutionError> {
        let tables: Vec<String> = contract.tables.iter().map(|t| t.name.to_string()).collect();
        let found = sqlx::query_as::<_, (String, String)>(
            "SELECT table_name::text, column_name::text FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = ANY($1)",
        )
        .bind(&tables)
        .fetch_all(&self.pool)
        .await?;
        Ok(diff_columns(contract, &found))
    }

    async fn run(&self, statement: &str) -> Result<i64, ExecutionError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        sqlx::query(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(statement)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| classify(e, self.timeout))?;
        tx.rollback().await?;

        let columns = rows.first().map_or(1, |r| r.columns().len());
        let value = rows.first().map(decode_first).transpose()?;
        coerce_scalar(rows.len(), columns, value)
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn execute(&self, statement: &GeneratedStatement) -> Result<i64, ExecutionError> {
        let started = std::time::Instant::now();
        let result = bounded(self.timeout, self.run(statement.as_str())).await;
        tracing::debug!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            ok = result.is_ok(),
            "statement executed"
        );
        result
    }
}

/// Runs `fut` under `limit`, cancelling it on expiry.
async fn bounded<F>(limit: Duration, fut: F) -> Result<i64, ExecutionError>
where
    F: Future<Output = Result<i64, ExecutionError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ExecutionError::Timeout(limit))?
}

/// Maps a server-side statement cancellation to a timeout; everything
/// else is a database error.
fn classify(e: sqlx::Error, limit: Duration) -> ExecutionError {
    if let sqlx::Error::Database(db) = &e
        && db.code().as_deref() == Some(QUERY_CANCELED)
    {
        return ExecutionError::Timeout(limit);
    }
    ExecutionError::from(e)
}

/// Decodes column 0 of `row` as an integer, float or `NUMERIC`, accepting
/// `NULL`.
fn decode_first(row: &PgRow) -> Result<Scalar, ExecutionError> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
        return Ok(v.map_or(Scalar::Null, Scalar::Int));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(0) {
        return Ok(v.map_or(Scalar::Null, |v| Scalar::Int(i64::from(v))));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(0) {
        return Ok(v.map_or(Scalar::Null, |v| Scalar::Int(i64::from(v))));
    }
    if let Ok(v) = row.try_get::<Option<BigDecimal>, _>(0) {
        return Ok(v.map_or(Scalar::Null, Scalar::Decimal));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(0) {
        return Ok(v.map_or(Scalar::Null, Scalar::Float));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(0) {
        return Ok(v.map_or(Scalar::Null, |v| Scalar::Float(f64::from(v))));
    }
    let type_name = row
        .columns()
        .first()
        .map(|c| c.type_info().to_string())
        .unwrap_or_default();
    Err(ExecutionError::Shape(format!(
        "column type {type_name} is not numeric"
    )))
}

/// Reduces a result set to one integer.
///
/// Zero rows and `NULL` both become `0`. Fractional values are rounded
/// half away from zero.
fn coerce_scalar(
    rows: usize,
    columns: usize,
    value: Option<Scalar>,
) -> Result<i64, ExecutionError> {
    if columns != 1 {
        return Err(ExecutionError::Shape(format!(
            "expected 1 column, got {columns}"
        )));
    }
    if rows > 1 {
        return Err(ExecutionError::Shape(format!("expected 1 row, got {rows}")));
    }
    match value {
        None | Some(Scalar::Null) => Ok(0),
        Some(Scalar::Int(v)) => Ok(v),
        Some(Scalar::Float(f)) if f.is_finite() => {
            #[allow(clippy::cast_possible_truncation)]
            let rounded = f.round() as i64;
            Ok(rounded)
        }
        Some(Scalar::Float(f)) => Err(ExecutionError::Shape(format!(
            "non-finite result {f}"
        ))),
        Some(Scalar::Decimal(d)) => d
            .with_scale_round(0, RoundingMode::HalfUp)
            .to_i64()
            .ok_or_else(|| ExecutionError::Shape(format!("result {d} does not fit in i64"))),
    }
}

/// Contract columns absent from the catalog listing `found`.
fn diff_columns(contract: &SchemaContract, found: &[(String, String)]) -> Vec<String> {
    contract
        .tables
        .iter()
        .flat_map(|t| t.columns.iter().map(move |c| (t.name, c.name)))
        .filter(|(table, column)| !found.iter().any(|(ft, fc)| ft == table && fc == column))
        .map(|(table, column)| format!("{table}.{column}"))
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::VIDEO_ANALYTICS;

    #[test]
    fn empty_result_set_is_zero() {
        assert_eq!(coerce_scalar(0, 1, None), Ok(0));
    }

    #[test]
    fn null_scalar_is_zero() {
        assert_eq!(coerce_scalar(1, 1, Some(Scalar::Null)), Ok(0));
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(coerce_scalar(1, 1, Some(Scalar::Int(1234))), Ok(1234));
    }

    #[test]
    fn floats_are_rounded() {
        assert_eq!(coerce_scalar(1, 1, Some(Scalar::Float(41.6))), Ok(42));
        assert!(matches!(
            coerce_scalar(1, 1, Some(Scalar::Float(f64::NAN))),
            Err(ExecutionError::Shape(_))
        ));
    }

    fn decimal(text: &str) -> Scalar {
        let Ok(d) = text.parse::<BigDecimal>() else {
            panic!("bad decimal literal {text}");
        };
        Scalar::Decimal(d)
    }

    #[test]
    fn numeric_results_become_integers() {
        assert_eq!(coerce_scalar(1, 1, Some(decimal("358"))), Ok(358));
        assert_eq!(coerce_scalar(1, 1, Some(decimal("12.5"))), Ok(13));
        assert_eq!(coerce_scalar(1, 1, Some(decimal("12.49"))), Ok(12));
        assert_eq!(coerce_scalar(1, 1, Some(decimal("-2.5"))), Ok(-3));
        assert_eq!(coerce_scalar(1, 1, Some(decimal("0.000"))), Ok(0));
    }

    #[test]
    fn numeric_overflow_is_a_shape_error() {
        assert!(matches!(
            coerce_scalar(1, 1, Some(decimal("99999999999999999999999"))),
            Err(ExecutionError::Shape(_))
        ));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(matches!(
            coerce_scalar(1, 2, Some(Scalar::Int(1))),
            Err(ExecutionError::Shape(_))
        ));
        assert!(matches!(
            coerce_scalar(3, 1, Some(Scalar::Int(1))),
            Err(ExecutionError::Shape(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_statement_times_out() {
        let limit = Duration::from_secs(60);
        let result = bounded(limit, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1)
        })
        .await;
        assert_eq!(result, Err(ExecutionError::Timeout(limit)));
    }

    #[tokio::test]
    async fn fast_statement_is_not_bounded() {
        let result = bounded(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn diff_reports_only_missing_columns() {
        let mut found: Vec<(String, String)> = VIDEO_ANALYTICS
            .tables
            .iter()
            .flat_map(|t| {
                t.columns
                    .iter()
                    .map(move |c| (t.name.to_string(), c.name.to_string()))
            })
            .collect();
        assert!(diff_columns(&VIDEO_ANALYTICS, &found).is_empty());

        found.retain(|(t, c)| !(t == "video_snapshots" && c == "delta_views_count"));
        assert_eq!(
            diff_columns(&VIDEO_ANALYTICS, &found),
            vec!["video_snapshots.delta_views_count".to_string()]
        );
    }

    #[derive(Debug)]
    struct ServerError(&'static str);

    impl std::fmt::Display for ServerError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "server error {}", self.0)
        }
    }

    impl std::error::Error for ServerError {}

    impl sqlx::error::DatabaseError for ServerError {
        fn message(&self) -> &str {
            "canceling statement due to statement timeout"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn server_side_cancellation_is_a_timeout() {
        let limit = Duration::from_secs(60);
        let err = classify(sqlx::Error::Database(Box::new(ServerError("57014"))), limit);
        assert_eq!(err, ExecutionError::Timeout(limit));
    }

    #[test]
    fn other_server_errors_stay_database_errors() {
        let err = classify(
            sqlx::Error::Database(Box::new(ServerError("42P01"))),
            Duration::from_secs(60),
        );
        assert!(matches!(err, ExecutionError::Database(_)));
    }

    /// Runs only when `TEST_DATABASE_URL` points at a PostgreSQL instance.
    #[tokio::test]
    async fn every_numeric_result_type_decodes_against_a_live_store() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let Ok(executor) = PostgresExecutor::connect_lazy(
            &url,
            2,
            0,
            Duration::from_secs(5),
            Duration::from_secs(5),
        ) else {
            panic!("invalid TEST_DATABASE_URL");
        };

        let cases = [
            ("SELECT COUNT(*) FROM generate_series(1, 5);", 5),
            ("SELECT SUM(g) FROM generate_series(1, 4) g;", 10),
            ("SELECT SUM(g::bigint) FROM generate_series(1, 4) g;", 10),
            ("SELECT SUM(n) FROM (SELECT COUNT(*) AS n FROM generate_series(1, 6) g GROUP BY g % 2) t;", 6),
            ("SELECT ROUND(SUM(g)::numeric / COUNT(*)) FROM generate_series(1, 4) g;", 3),
            ("SELECT SUM(g::real) FROM generate_series(1, 3) g;", 6),
            ("SELECT SUM(g::float8) FROM generate_series(1, 3) g;", 6),
            ("SELECT COALESCE(SUM(g), 0) FROM generate_series(1, 0) g;", 0),
            ("SELECT SUM(g) FROM generate_series(1, 0) g;", 0),
        ];
        for (sql, expected) in cases {
            let statement = GeneratedStatement::new(sql.to_string());
            assert_eq!(executor.execute(&statement).await, Ok(expected), "{sql}");
        }
    }

    #[test]
    fn database_errors_carry_message() {
        let err = ExecutionError::from(sqlx::Error::PoolTimedOut);
        let ExecutionError::Database(message) = err else {
            panic!("expected database error");
        };
        assert!(!message.is_empty());
    }
}
