use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commits_types::{CommitmentDraft, CommitmentId, CommitmentRecord, UserHandle};

/// Order of list reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// Oldest first, as created.
    #[default]
    Insertion,
    /// By `created_at`, newest first.
    NewestFirst,
}

/// Storage interface for commitment records.
#[async_trait]
pub trait CommitmentStore: Send + Sync {
    /// Persist a draft, assigning `id` and `created_at`.
    async fn create(&self, draft: CommitmentDraft) -> StorageResult<CommitmentRecord>;

    async fn find_all(&self, order: ListOrder) -> StorageResult<Vec<CommitmentRecord>>;

    async fn find_by_user(
        &self,
        user: &UserHandle,
        order: ListOrder,
    ) -> StorageResult<Vec<CommitmentRecord>>;

    /// Byte-exact lookup by raw expression. The newest match wins.
    async fn find_one(&self, raw_expression: &str) -> StorageResult<Option<CommitmentRecord>>;

    async fn find_by_id(&self, id: CommitmentId) -> StorageResult<Option<CommitmentRecord>>;

    /// Set `completed_at`. Fails with `NotFound` for unknown ids and
    /// `Conflict` when the record is already completed.
    async fn mark_completed(
        &self,
        id: CommitmentId,
        at: DateTime<Utc>,
    ) -> StorageResult<CommitmentRecord>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: CommitmentId) -> StorageResult<bool>;

    /// Returns the number of records removed.
    async fn delete_all(&self) -> StorageResult<usize>;

    /// Newest record of `user` published with exactly `raw_expression`.
    async fn find_for_user(
        &self,
        user: &UserHandle,
        raw_expression: &str,
    ) -> StorageResult<Option<CommitmentRecord>> {
        Ok(self
            .find_by_user(user, ListOrder::NewestFirst)
            .await?
            .into_iter()
            .find(|record| record.raw_expression == raw_expression))
    }
}
