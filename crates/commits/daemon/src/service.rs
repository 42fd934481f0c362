//! The parse → store → score pipeline behind the REST handlers.

use chrono::{DateTime, Utc};
use commits_credit::{CreditEngine, ScoredCommitment, UserStanding};
use commits_parser::{Modifier, PromiseParser};
use commits_storage::{CommitmentStore, ListOrder};
use commits_types::{group_by_user, CommitmentId, CommitmentRecord, UserHandle};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::address::CommitmentAddress;
use crate::error::ServiceError;

/// Scored records keyed by user, each list newest first.
pub type GroupedCommitments = BTreeMap<UserHandle, Vec<ScoredCommitment>>;

/// Orchestrates parsing, persistence and scoring.
pub struct CommitmentService {
    store: Arc<dyn CommitmentStore>,
    parser: Arc<PromiseParser>,
    credit: CreditEngine,
}

impl CommitmentService {
    pub fn new(
        store: Arc<dyn CommitmentStore>,
        parser: Arc<PromiseParser>,
        credit: CreditEngine,
    ) -> Self {
        Self {
            store,
            parser,
            credit,
        }
    }

    /// Parse and persist the commitment published at `address`.
    ///
    /// A completion marker in the expression completes the new record at
    /// `now`.
    pub async fn create(
        &self,
        address: &CommitmentAddress,
        now: DateTime<Utc>,
    ) -> Result<ScoredCommitment, ServiceError> {
        let parsed = self.parser.parse(
            address.user.as_str(),
            address.kind,
            &address.raw_expression,
            now,
        )?;

        let mut record = self.store.create(parsed.draft).await?;
        tracing::info!(
            id = %record.id,
            user = %record.user,
            kind = %record.kind,
            due_at = ?record.due_at,
            "created commitment"
        );

        if parsed.modifier == Some(Modifier::Completed) {
            record = match self.store.mark_completed(record.id, now).await {
                Ok(done) => done,
                Err(error) => {
                    // The caller sees a failed create, so the open record must go.
                    match self.store.delete_by_id(record.id).await {
                        Ok(_) => tracing::warn!(
                            id = %record.id,
                            %error,
                            "completing new commitment failed, record removed"
                        ),
                        Err(cleanup) => tracing::error!(
                            id = %record.id,
                            %error,
                            %cleanup,
                            "completing new commitment failed, open record left behind"
                        ),
                    }
                    return Err(error.into());
                }
            };
            tracing::info!(id = %record.id, "commitment created as already kept");
        }

        Ok(self.score_one(record, now))
    }

    /// The newest record published at exactly this address.
    pub async fn find(
        &self,
        address: &CommitmentAddress,
        now: DateTime<Utc>,
    ) -> Result<Option<ScoredCommitment>, ServiceError> {
        let record = self
            .store
            .find_for_user(&address.user, &address.raw_expression)
            .await?;
        Ok(record.map(|record| self.score_one(record, now)))
    }

    /// All records, or one user's, grouped by user and newest first.
    pub async fn list_grouped(
        &self,
        user: Option<&UserHandle>,
        now: DateTime<Utc>,
    ) -> Result<GroupedCommitments, ServiceError> {
        let records = match user {
            Some(user) => self.store.find_by_user(user, ListOrder::NewestFirst).await?,
            None => self.store.find_all(ListOrder::NewestFirst).await?,
        };
        Ok(group_by_user(self.credit.score_all(&records, now)))
    }

    pub async fn complete(
        &self,
        id: CommitmentId,
        now: DateTime<Utc>,
    ) -> Result<ScoredCommitment, ServiceError> {
        let record = self.store.mark_completed(id, now).await?;
        tracing::info!(id = %record.id, user = %record.user, "commitment completed");
        Ok(self.score_one(record, now))
    }

    pub async fn delete(&self, id: CommitmentId) -> Result<bool, ServiceError> {
        let removed = self.store.delete_by_id(id).await?;
        tracing::info!(%id, removed, "delete commitment");
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<usize, ServiceError> {
        let removed = self.store.delete_all().await?;
        tracing::warn!(removed, "cleared all commitments");
        Ok(removed)
    }

    pub async fn standings(
        &self,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<UserHandle, UserStanding>, ServiceError> {
        let records = self.store.find_all(ListOrder::Insertion).await?;
        Ok(self.credit.standing(&records, now))
    }

    fn score_one(&self, record: CommitmentRecord, now: DateTime<Utc>) -> ScoredCommitment {
        ScoredCommitment {
            credit: self.credit.score(&record, now),
            timeliness: self.credit.timeliness(&record, now),
            record,
        }
    }
}
