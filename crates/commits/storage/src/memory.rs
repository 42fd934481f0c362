//! In-memory commitment store.
//!
//! Deterministic and test-friendly; contents are lost on restart.

use crate::traits::{CommitmentStore, ListOrder};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commits_types::{CommitmentDraft, CommitmentId, CommitmentRecord, UserHandle};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order; `created_at` is non-decreasing along the vector.
    records: Vec<CommitmentRecord>,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-memory commitment store.
#[derive(Debug, Default)]
pub struct InMemoryCommitmentStore {
    inner: RwLock<Inner>,
}

impl InMemoryCommitmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn ordered<'a, I>(records: I, order: ListOrder) -> Vec<CommitmentRecord>
where
    I: DoubleEndedIterator<Item = &'a CommitmentRecord>,
{
    match order {
        ListOrder::Insertion => records.cloned().collect(),
        ListOrder::NewestFirst => records.rev().cloned().collect(),
    }
}

#[async_trait]
impl CommitmentStore for InMemoryCommitmentStore {
    async fn create(&self, draft: CommitmentDraft) -> StorageResult<CommitmentRecord> {
        let mut guard = self.inner.write().await;

        let now = Utc::now();
        let created_at = guard.last_created_at.map_or(now, |last| last.max(now));
        guard.last_created_at = Some(created_at);

        let record = draft.into_record(CommitmentId::new(), created_at);
        guard.records.push(record.clone());
        Ok(record)
    }

    async fn find_all(&self, order: ListOrder) -> StorageResult<Vec<CommitmentRecord>> {
        let guard = self.inner.read().await;
        Ok(ordered(guard.records.iter(), order))
    }

    async fn find_by_user(
        &self,
        user: &UserHandle,
        order: ListOrder,
    ) -> StorageResult<Vec<CommitmentRecord>> {
        let guard = self.inner.read().await;
        Ok(ordered(
            guard.records.iter().filter(|record| &record.user == user),
            order,
        ))
    }

    async fn find_one(&self, raw_expression: &str) -> StorageResult<Option<CommitmentRecord>> {
        let guard = self.inner.read().await;
        Ok(guard
            .records
            .iter()
            .rev()
            .find(|record| record.raw_expression == raw_expression)
            .cloned())
    }

    async fn find_by_id(&self, id: CommitmentId) -> StorageResult<Option<CommitmentRecord>> {
        let guard = self.inner.read().await;
        Ok(guard.records.iter().find(|record| record.id == id).cloned())
    }

    async fn mark_completed(
        &self,
        id: CommitmentId,
        at: DateTime<Utc>,
    ) -> StorageResult<CommitmentRecord> {
        let mut guard = self.inner.write().await;
        let record = guard
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("commitment {id}")))?;

        if let Some(done) = record.completed_at {
            return Err(StorageError::Conflict(format!(
                "commitment {id} already completed at {done}"
            )));
        }
        record.completed_at = Some(at);
        Ok(record.clone())
    }

    async fn delete_by_id(&self, id: CommitmentId) -> StorageResult<bool> {
        let mut guard = self.inner.write().await;
        let before = guard.records.len();
        guard.records.retain(|record| record.id != id);
        Ok(guard.records.len() < before)
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        let mut guard = self.inner.write().await;
        let removed = guard.records.len();
        guard.records.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use commits_types::{group_by_user, CommitmentKind};
    use std::sync::Arc;

    fn draft(user: &str, raw: &str) -> CommitmentDraft {
        CommitmentDraft {
            user: UserHandle::parse(user).unwrap(),
            kind: CommitmentKind::Promise,
            raw_expression: raw.to_string(),
            action_text: raw.replace('-', " "),
            due_at: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let store = InMemoryCommitmentStore::new();
        let before = Utc::now();
        let record = store.create(draft("bob", "call-mom")).await.unwrap();

        assert!(record.created_at >= before);
        assert!(record.is_open());
        assert_eq!(store.find_by_id(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn delete_one_then_all() {
        let store = InMemoryCommitmentStore::new();
        let mut ids = Vec::new();
        for raw in ["a", "b", "c"] {
            ids.push(store.create(draft("bob", raw)).await.unwrap().id);
        }

        assert!(store.delete_by_id(ids[1]).await.unwrap());
        let remaining = store.find_all(ListOrder::Insertion).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|r| r.id != ids[1]));

        assert!(!store.delete_by_id(ids[1]).await.unwrap());
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.find_all(ListOrder::Insertion).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn find_one_round_trips_raw_expression() {
        let store = InMemoryCommitmentStore::new();
        let raw = "finish%20report_by-2030-01-01/done";
        store.create(draft("bob", raw)).await.unwrap();

        let found = store.find_one(raw).await.unwrap().unwrap();
        assert_eq!(found.raw_expression.as_bytes(), raw.as_bytes());
        assert!(store.find_one("finish report").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_one_prefers_newest() {
        let store = InMemoryCommitmentStore::new();
        store.create(draft("bob", "same")).await.unwrap();
        let newer = store.create(draft("alice", "same")).await.unwrap();

        assert_eq!(store.find_one("same").await.unwrap().unwrap().id, newer.id);

        let bob = UserHandle::parse("bob").unwrap();
        let bobs = store.find_for_user(&bob, "same").await.unwrap().unwrap();
        assert_eq!(bobs.user, bob);
    }

    #[tokio::test]
    async fn created_at_is_monotonic_under_concurrency() {
        let store = Arc::new(InMemoryCommitmentStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.create(draft("bob", &format!("task-{i}"))).await.unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let all = store.find_all(ListOrder::Insertion).await.unwrap();
        assert_eq!(all.len(), 32);
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let newest_first = store.find_all(ListOrder::NewestFirst).await.unwrap();
        assert_eq!(newest_first.first().map(|r| r.id), all.last().map(|r| r.id));
    }

    #[tokio::test]
    async fn interleaved_users_group_in_creation_order() {
        let store = InMemoryCommitmentStore::new();
        for (user, raw) in [("bob", "b1"), ("alice", "a1"), ("bob", "b2"), ("alice", "a2"), ("bob", "b3")] {
            store.create(draft(user, raw)).await.unwrap();
        }

        let groups = group_by_user(store.find_all(ListOrder::Insertion).await.unwrap());
        let raws = |user: &str| -> Vec<String> {
            groups[&UserHandle::parse(user).unwrap()]
                .iter()
                .map(|r| r.raw_expression.clone())
                .collect()
        };
        assert_eq!(raws("bob"), vec!["b1", "b2", "b3"]);
        assert_eq!(raws("alice"), vec!["a1", "a2"]);

        let bob = UserHandle::parse("bob").unwrap();
        let newest: Vec<_> = store
            .find_by_user(&bob, ListOrder::NewestFirst)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.raw_expression)
            .collect();
        assert_eq!(newest, vec!["b3", "b2", "b1"]);
    }

    #[tokio::test]
    async fn mark_completed_once() {
        let store = InMemoryCommitmentStore::new();
        let record = store.create(draft("bob", "call-mom")).await.unwrap();
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        let done = store.mark_completed(record.id, at).await.unwrap();
        assert_eq!(done.completed_at, Some(at));
        assert_eq!(done.raw_expression, record.raw_expression);

        let again = store.mark_completed(record.id, at + Duration::hours(1)).await;
        assert!(matches!(again, Err(StorageError::Conflict(_))));

        let missing = store.mark_completed(CommitmentId::new(), at).await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn CommitmentStore) {}
    }
}
