//! Denylist storage for tokens rejected ahead of their natural expiry.
//!
//! The primary key is the literal signed token string. Writes go through a
//! transaction; lookups run without one.

use super::executor::TransactionExecutor;

/// Why a token was put on the denylist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenylistReason {
    /// Explicit logout or administrative revocation
    Invalidated,
    /// Natural expiry. Nothing here writes this tag; it is kept so rows
    /// imported with it read back unchanged and are swept like any other.
    Expired,
}

impl DenylistReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenylistReason::Invalidated => "invalidated",
            DenylistReason::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "expired" => DenylistReason::Expired,
            _ => DenylistReason::Invalidated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenylistEntry {
    /// The signed token string
    pub id: String,
    pub reason: DenylistReason,
}

impl DenylistEntry {
    pub fn new(id: impl Into<String>, reason: DenylistReason) -> Self {
        Self {
            id: id.into(),
            reason,
        }
    }

    /// Entry for a token invalidated at logout.
    pub fn invalidated(id: impl Into<String>) -> Self {
        Self::new(id, DenylistReason::Invalidated)
    }
}

#[derive(sqlx::FromRow)]
struct DenylistRow {
    id: String,
    reason: String,
}

impl From<DenylistRow> for DenylistEntry {
    fn from(row: DenylistRow) -> Self {
        Self {
            id: row.id,
            reason: DenylistReason::from_str(&row.reason),
        }
    }
}

/// Errors from denylist operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row with the requested id. A lookup miss, not a failure.
    #[error("denylist entry not found")]
    NotFound,
    #[error("denylist entry already exists")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    fn from_insert(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            StoreError::Duplicate
        } else {
            StoreError::Database(e)
        }
    }
}

/// Store for denylist entries.
#[derive(Clone)]
pub struct DenylistStore {
    executor: TransactionExecutor,
}

impl DenylistStore {
    pub fn new(executor: TransactionExecutor) -> Self {
        Self { executor }
    }

    /// Insert one entry.
    pub async fn create(&self, entry: DenylistEntry) -> Result<DenylistEntry, StoreError> {
        self.executor
            .execute_in_transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query("INSERT INTO denylist (id, reason) VALUES (?, ?)")
                        .bind(&entry.id)
                        .bind(entry.reason.as_str())
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::from_insert)?;
                    Ok::<_, StoreError>(entry)
                })
            })
            .await
    }

    /// Delete an entry by id.
    ///
    /// Returns `NotFound` when no row was removed, so callers can tell an
    /// entry that was already gone from one they removed.
    pub async fn delete(&self, entry: DenylistEntry) -> Result<DenylistEntry, StoreError> {
        self.executor
            .execute_in_transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query("DELETE FROM denylist WHERE id = ?")
                        .bind(&entry.id)
                        .execute(&mut *conn)
                        .await?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::NotFound);
                    }
                    Ok(entry)
                })
            })
            .await
    }

    /// Look up an entry by token string.
    pub async fn find_by_id(&self, id: &str) -> Result<DenylistEntry, StoreError> {
        let id = id.to_string();
        self.executor
            .execute_without_transaction(move |conn| {
                Box::pin(async move {
                    let row: Option<DenylistRow> =
                        sqlx::query_as("SELECT id, reason FROM denylist WHERE id = ?")
                            .bind(&id)
                            .fetch_optional(&mut *conn)
                            .await?;
                    row.map(DenylistEntry::from).ok_or(StoreError::NotFound)
                })
            })
            .await
    }

    /// All entries, oldest first.
    pub async fn find_all(&self) -> Result<Vec<DenylistEntry>, StoreError> {
        self.executor
            .execute_without_transaction(|conn| {
                Box::pin(async move {
                    let rows: Vec<DenylistRow> = sqlx::query_as(
                        "SELECT id, reason FROM denylist ORDER BY created_at, rowid",
                    )
                    .fetch_all(&mut *conn)
                    .await?;
                    Ok::<_, StoreError>(rows.into_iter().map(DenylistEntry::from).collect())
                })
            })
            .await
    }

    /// Number of entries.
    pub async fn count(&self) -> Result<i64, StoreError> {
        self.executor
            .execute_without_transaction(|conn| {
                Box::pin(async move {
                    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM denylist")
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok::<_, StoreError>(row.0)
                })
            })
            .await
    }
}
