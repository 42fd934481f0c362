//! Commitment records and the unsaved drafts the parser produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{CommitmentKind, UserHandle};

// ── Identifier ──────────────────────────────────────────────────────────

/// Opaque record identifier, assigned by the store on creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentId(pub Uuid);

impl CommitmentId {
    /// Generate a new unique commitment ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommitmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommitmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommitmentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ── Draft ───────────────────────────────────────────────────────────────

/// A parsed commitment that has not been persisted yet.
///
/// Carries every record field except the store-assigned `id` and
/// `created_at`; a draft is never completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentDraft {
    pub user: UserHandle,
    pub kind: CommitmentKind,
    /// The undecoded path text exactly as typed.
    pub raw_expression: String,
    /// What is being promised, deadline phrase removed.
    pub action_text: String,
    pub due_at: Option<DateTime<Utc>>,
}

impl CommitmentDraft {
    /// Attach the store-assigned fields.
    pub fn into_record(self, id: CommitmentId, created_at: DateTime<Utc>) -> CommitmentRecord {
        CommitmentRecord {
            id,
            user: self.user,
            raw_expression: self.raw_expression,
            action_text: self.action_text,
            kind: self.kind,
            due_at: self.due_at,
            created_at,
            completed_at: None,
        }
    }
}

// ── Record ──────────────────────────────────────────────────────────────

/// The durable unit: one published commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentRecord {
    pub id: CommitmentId,
    pub user: UserHandle,
    pub raw_expression: String,
    pub action_text: String,
    pub kind: CommitmentKind,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CommitmentRecord {
    /// Completed commitments are resolved.
    pub fn is_resolved(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Not yet completed; eligible for lateness evaluation.
    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }

    /// Open with a deadline that has been reached.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_at.is_some_and(|due| now >= due)
    }

    /// The address this commitment was published at, e.g.
    /// `bob.promises.to/quit-smoking-by-2030-01-01`.
    pub fn address(&self) -> String {
        format!("{}.{}/{}", self.user, self.kind.domain(), self.raw_expression)
    }
}

impl AsRef<CommitmentRecord> for CommitmentRecord {
    fn as_ref(&self) -> &CommitmentRecord {
        self
    }
}
