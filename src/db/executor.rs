//! Units of work over pooled SQLite connections.
//!
//! Every call checks out its own connection and gives it back before
//! returning. The connection is only reachable through the `&mut` handed to
//! the work closure, so it cannot outlive the call or be shared between
//! concurrent calls.
//!
//! Release does not depend on the work succeeding: both the pool guard and
//! the transaction release on drop, which also covers a caller dropping the
//! future halfway through (cancellation). An uncommitted transaction is
//! rolled back when dropped.

use futures::future::BoxFuture;
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tracing::warn;

/// Runs work against a single connection, with or without a transaction.
#[derive(Clone)]
pub struct TransactionExecutor {
    pool: SqlitePool,
}

impl TransactionExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run `work` inside a transaction.
    ///
    /// Commits only when `work` returns `Ok`. On `Err` the transaction is
    /// rolled back and the work's error is returned unchanged.
    pub async fn execute_in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<sqlx::Error>,
    {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back transaction");
                }
                Err(e)
            }
        }
    }

    /// Run `work` on a connection without opening a transaction.
    ///
    /// Meant for read-only queries.
    pub async fn execute_without_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<sqlx::Error>,
    {
        let mut conn = self.pool.acquire().await?;
        work(&mut *conn).await
    }
}
