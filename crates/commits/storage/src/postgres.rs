//! PostgreSQL commitment store.
//!
//! Rows live in a single `commitments` table. A `BIGSERIAL` column records
//! insertion order; creates take a transaction-scoped advisory lock so that
//! `created_at` stays monotonic even with several daemons on one database.

use crate::traits::{CommitmentStore, ListOrder};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commits_types::{CommitmentDraft, CommitmentId, CommitmentKind, CommitmentRecord, UserHandle};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

/// Advisory lock key serializing inserts.
const CREATE_LOCK_KEY: i64 = 0x636f_6d6d_6974;

const COLUMNS: &str =
    "id, user_handle, raw_expression, action_text, kind, due_at, created_at, completed_at";

/// PostgreSQL-backed commitment store.
#[derive(Clone)]
pub struct PostgresCommitmentStore {
    pool: PgPool,
}

impl PostgresCommitmentStore {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Unavailable(format!("failed to connect postgres: {e}")))?;
        Self::from_pool(pool).await
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS commitments (
        seq BIGSERIAL PRIMARY KEY,
        id UUID NOT NULL UNIQUE,
        user_handle TEXT NOT NULL,
        raw_expression TEXT NOT NULL,
        action_text TEXT NOT NULL,
        kind TEXT NOT NULL,
        due_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        completed_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS commitments_user_idx ON commitments (user_handle, seq)",
    "CREATE INDEX IF NOT EXISTS commitments_expression_idx ON commitments (raw_expression)",
    "CREATE INDEX IF NOT EXISTS commitments_user_expression_idx ON commitments (user_handle, raw_expression)",
    // Serves MAX(created_at) on every insert and newest-first listings.
    "CREATE INDEX IF NOT EXISTS commitments_created_idx ON commitments (created_at)",
];

fn find_for_user_sql() -> String {
    format!(
        "SELECT {COLUMNS} FROM commitments \
         WHERE user_handle = $1 AND raw_expression = $2 ORDER BY {} LIMIT 1",
        order_clause(ListOrder::NewestFirst)
    )
}

#[async_trait]
impl CommitmentStore for PostgresCommitmentStore {
    async fn create(&self, draft: CommitmentDraft) -> StorageResult<CommitmentRecord> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CREATE_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let last: Option<DateTime<Utc>> = sqlx::query_scalar("SELECT MAX(created_at) FROM commitments")
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let now = Utc::now();
        let created_at = last.map_or(now, |last| last.max(now));

        let record = draft.into_record(CommitmentId::new(), created_at);
        sqlx::query(
            r#"
            INSERT INTO commitments
                (id, user_handle, raw_expression, action_text, kind, due_at, created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL)
            "#,
        )
        .bind(record.id.0)
        .bind(record.user.as_str())
        .bind(&record.raw_expression)
        .bind(&record.action_text)
        .bind(record.kind.as_str())
        .bind(record.due_at)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(record)
    }

    async fn find_all(&self, order: ListOrder) -> StorageResult<Vec<CommitmentRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM commitments ORDER BY {}", order_clause(order));
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(row_to_record).collect()
    }

    async fn find_by_user(
        &self,
        user: &UserHandle,
        order: ListOrder,
    ) -> StorageResult<Vec<CommitmentRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM commitments WHERE user_handle = $1 ORDER BY {}",
            order_clause(order)
        );
        let rows = sqlx::query(&sql)
            .bind(user.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(row_to_record).collect()
    }

    async fn find_one(&self, raw_expression: &str) -> StorageResult<Option<CommitmentRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM commitments WHERE raw_expression = $1 ORDER BY {} LIMIT 1",
            order_clause(ListOrder::NewestFirst)
        );
        let row = sqlx::query(&sql)
            .bind(raw_expression)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_id(&self, id: CommitmentId) -> StorageResult<Option<CommitmentRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM commitments WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn mark_completed(
        &self,
        id: CommitmentId,
        at: DateTime<Utc>,
    ) -> StorageResult<CommitmentRecord> {
        let sql = format!(
            "UPDATE commitments SET completed_at = $2 \
             WHERE id = $1 AND completed_at IS NULL RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row_to_record(&row),
            None => match self.find_by_id(id).await? {
                Some(existing) => Err(StorageError::Conflict(format!(
                    "commitment {id} already completed at {}",
                    existing
                        .completed_at
                        .map(|done| done.to_rfc3339())
                        .unwrap_or_default()
                ))),
                None => Err(StorageError::NotFound(format!("commitment {id}"))),
            },
        }
    }

    async fn find_for_user(
        &self,
        user: &UserHandle,
        raw_expression: &str,
    ) -> StorageResult<Option<CommitmentRecord>> {
        let row = sqlx::query(&find_for_user_sql())
            .bind(user.as_str())
            .bind(raw_expression)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete_by_id(&self, id: CommitmentId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM commitments WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM commitments")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        usize::try_from(result.rows_affected())
            .map_err(|_| StorageError::Backend("deleted row count overflows usize".to_string()))
    }
}

fn order_clause(order: ListOrder) -> &'static str {
    match order {
        ListOrder::Insertion => "seq ASC",
        ListOrder::NewestFirst => "created_at DESC, seq DESC",
    }
}

fn row_to_record(row: &PgRow) -> StorageResult<CommitmentRecord> {
    let user: String = row
        .try_get("user_handle")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let kind: String = row
        .try_get("kind")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    Ok(CommitmentRecord {
        id: CommitmentId(
            row.try_get::<Uuid, _>("id")
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
        ),
        user: UserHandle::parse(user).map_err(|e| StorageError::Serialization(e.to_string()))?,
        raw_expression: row
            .try_get("raw_expression")
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        action_text: row
            .try_get("action_text")
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        kind: kind
            .parse::<CommitmentKind>()
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        due_at: row
            .try_get("due_at")
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        completed_at: row
            .try_get("completed_at")
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
    })
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StorageError::Conflict(db_err.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(err.to_string())
        }
        _ => StorageError::Backend(err.to_string()),
    }
}
