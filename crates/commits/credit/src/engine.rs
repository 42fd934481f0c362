use chrono::{DateTime, Duration, Utc};
use commits_types::CommitmentRecord;
use serde::{Deserialize, Serialize};

use crate::{CreditPolicy, CreditValue, PolicyError};

/// Where a commitment stands relative to its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeliness {
    /// Open, and either undated or not yet due.
    Pending,
    /// Open and past its deadline.
    Overdue,
    /// Completed on or before the deadline, or completed without one.
    Kept,
    /// Completed after the deadline.
    KeptLate,
}

/// A record annotated with its credit at some instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCommitment {
    #[serde(flatten)]
    pub record: CommitmentRecord,
    pub credit: CreditValue,
    pub timeliness: Timeliness,
}

impl AsRef<CommitmentRecord> for ScoredCommitment {
    fn as_ref(&self) -> &CommitmentRecord {
        &self.record
    }
}

/// Scores records under a validated [`CreditPolicy`].
///
/// Pure computation; one engine can be shared by any number of tasks.
#[derive(Debug, Clone, Copy)]
pub struct CreditEngine {
    policy: CreditPolicy,
}

impl CreditEngine {
    pub fn new(policy: CreditPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &CreditPolicy {
        &self.policy
    }

    /// Credit of `record` as of `now`.
    pub fn score(&self, record: &CommitmentRecord, now: DateTime<Utc>) -> CreditValue {
        let Some(due) = record.due_at else {
            return CreditValue::ZERO;
        };
        let value = match record.completed_at {
            Some(done) if done <= due => self.policy.early_credit_per_hour * hours(due - done),
            Some(done) => -self.policy.late_penalty_per_hour * hours(done - due),
            None if now < due => 0.0,
            None => -self.policy.late_penalty_per_hour * hours(now - due),
        };
        CreditValue::new(value)
    }

    pub fn timeliness(&self, record: &CommitmentRecord, now: DateTime<Utc>) -> Timeliness {
        match (record.completed_at, record.due_at) {
            (Some(done), Some(due)) if done > due => Timeliness::KeptLate,
            (Some(_), _) => Timeliness::Kept,
            (None, _) if record.is_overdue(now) => Timeliness::Overdue,
            (None, _) => Timeliness::Pending,
        }
    }

    /// Annotate records, keeping their order.
    pub fn score_all<'a, I>(&self, records: I, now: DateTime<Utc>) -> Vec<ScoredCommitment>
    where
        I: IntoIterator<Item = &'a CommitmentRecord>,
    {
        records
            .into_iter()
            .map(|record| ScoredCommitment {
                credit: self.score(record, now),
                timeliness: self.timeliness(record, now),
                record: record.clone(),
            })
            .collect()
    }
}

impl Default for CreditEngine {
    fn default() -> Self {
        Self {
            policy: CreditPolicy::default(),
        }
    }
}

/// Best standing first; equal credit falls back to newest first.
pub fn rank(mut scored: Vec<ScoredCommitment>) -> Vec<ScoredCommitment> {
    scored.sort_by(|a, b| {
        b.credit
            .cmp(&a.credit)
            .then_with(|| b.record.created_at.cmp(&a.record.created_at))
    });
    scored
}

fn hours(span: Duration) -> f64 {
    span.num_milliseconds() as f64 / 3_600_000.0
}
