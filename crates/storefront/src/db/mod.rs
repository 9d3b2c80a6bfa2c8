//! Database access for the storefront `PostgreSQL`.
//!
//! # Database: `tienda`
//!
//! ## Tables
//!
//! - `customers` - Accounts that can log in
//! - `categories` - Product categories
//! - `products` - Catalog with price and stock
//! - `cart` - Open cart lines, one per (customer, product, size)
//! - `orders` / `order_lines` - Completed checkouts with price snapshots
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p tienda-cli -- migrate
//! ```
//!
//! # Store lifecycle
//!
//! [`Store`] is opened once in `main`, handed to the application state, and
//! closed during graceful shutdown. Multi-statement writes go through
//! [`Store::transaction`], which owns commit, rollback and retry.

pub mod cart;
pub mod customers;
pub mod orders;
pub mod products;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::Rng;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use cart::CartRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A value from the caller does not fit its column.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failure type of a unit of work run by [`Store::transaction`].
pub trait TransactionFailure: From<sqlx::Error> {
    /// Whether the whole unit of work may be retried from scratch.
    fn is_transient(&self) -> bool;
}

impl TransactionFailure for RepositoryError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Database(err) => is_transient(err),
            _ => false,
        }
    }
}

/// Whether a sqlx error is a serialization failure (`40001`) or deadlock (`40P01`).
#[must_use]
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
        }
        _ => false,
    }
}

/// Map a unique violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(err)
}

/// Map a numeric overflow (`22003`) to `RepositoryError::InvalidInput`.
pub(crate) fn invalid_on_overflow(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.code().as_deref() == Some("22003")
    {
        return RepositoryError::InvalidInput(what.to_owned());
    }
    RepositoryError::Database(err)
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    const fn set_statement(self) -> &'static str {
        match self {
            Self::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            Self::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            Self::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

/// Delay before the first retry; doubles per attempt up to [`MAX_RETRY_DELAY`].
const BASE_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(400);

/// Future returned by a unit of work, borrowing the transaction's connection.
pub type UnitOfWork<'c, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>;

/// Handle to the storefront database.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Open a connection pool and verify the database is reachable.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = pool_options(config)
            .connect(config.url.expose_secret())
            .await?;
        Ok(Self { pool })
    }

    /// Create a pool that connects on first use.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the URL cannot be parsed.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = pool_options(config).connect_lazy(config.url.expose_secret())?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check that a connection can be acquired and answers a query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database is unreachable.
    pub async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection. Pending acquires fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    /// Run `work` inside a transaction.
    ///
    /// The transaction is committed when `work` returns `Ok` and rolled back
    /// when it returns `Err`, when commit fails, or when the returned future is
    /// dropped. If the failure is transient (serialization conflict or
    /// deadlock), `work` runs again in a fresh transaction after a jittered
    /// exponential backoff, up to `max_attempts` runs in total. `work` must
    /// therefore re-read everything it depends on.
    ///
    /// Under `SERIALIZABLE`, every transaction that waited on a row lock
    /// fails once the holder commits, so each round of a race lets one
    /// contender through. Size `max_attempts` for the expected contention.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let count = store
    ///     .transaction(IsolationLevel::Serializable, 3, |conn| {
    ///         Box::pin(async move {
    ///             let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart")
    ///                 .fetch_one(&mut *conn)
    ///                 .await?;
    ///             Ok::<_, RepositoryError>(n)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn transaction<T, E, F>(
        &self,
        isolation: IsolationLevel,
        max_attempts: u32,
        mut work: F,
    ) -> Result<T, E>
    where
        T: Send,
        E: TransactionFailure + Send,
        F: for<'c> FnMut(&'c mut PgConnection) -> UnitOfWork<'c, T, E> + Send,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.run_once(isolation, &mut work).await {
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = retry_delay(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transaction conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn run_once<T, E, F>(&self, isolation: IsolationLevel, work: &mut F) -> Result<T, E>
    where
        T: Send,
        E: TransactionFailure + Send,
        F: for<'c> FnMut(&'c mut PgConnection) -> UnitOfWork<'c, T, E> + Send,
    {
        let mut tx = self.pool.begin().await?;
        sqlx::query(isolation.set_statement())
            .execute(&mut *tx)
            .await?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Backoff before retry number `attempt`: half the exponential step plus a
/// random share of the other half, so racing retries spread out.
fn retry_delay(attempt: u32) -> Duration {
    let step = BASE_RETRY_DELAY
        .saturating_mul(1 << attempt.saturating_sub(1).min(16))
        .min(MAX_RETRY_DELAY);
    let half = step / 2;
    half + half.mul_f64(rand::rng().random::<f64>())
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_statements() {
        assert_eq!(
            IsolationLevel::Serializable.set_statement(),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE"
        );
        assert_eq!(
            IsolationLevel::ReadCommitted.set_statement(),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED"
        );
    }

    #[test]
    fn test_non_database_errors_are_not_transient() {
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(!is_transient(&sqlx::Error::PoolTimedOut));
        assert!(!RepositoryError::NotFound.is_transient());
        assert!(!RepositoryError::Conflict("x".to_owned()).is_transient());
    }

    #[test]
    fn test_invalid_on_overflow_passes_other_errors_through() {
        let err = invalid_on_overflow(sqlx::Error::RowNotFound, "quantity too large");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
        assert!(!RepositoryError::InvalidInput("x".to_owned()).is_transient());
    }

    #[test]
    fn test_retry_delay_grows_and_is_capped() {
        for _ in 0..20 {
            let first = retry_delay(1);
            assert!(first >= Duration::from_millis(5) && first <= Duration::from_millis(10));

            let third = retry_delay(3);
            assert!(third >= Duration::from_millis(20) && third <= Duration::from_millis(40));

            let late = retry_delay(30);
            assert!(late >= MAX_RETRY_DELAY / 2 && late <= MAX_RETRY_DELAY);
        }
    }

    #[test]
    fn test_conflict_on_unique_passes_other_errors_through() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "email already exists");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}
