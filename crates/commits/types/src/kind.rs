use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::FieldError;

/// Which domain the commitment was published under.
///
/// Decided once where the address is split and passed around as a value;
/// only display semantics depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitmentKind {
    /// Published under `promises.to`.
    Promise,
    /// Published under `commits.to`.
    Commit,
}

impl CommitmentKind {
    pub const ALL: [CommitmentKind; 2] = [CommitmentKind::Promise, CommitmentKind::Commit];

    /// The domain suffix this kind is published under.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Promise => "promises.to",
            Self::Commit => "commits.to",
        }
    }

    /// Resolve a kind from a domain suffix such as `promises.to`.
    pub fn from_domain(domain: &str) -> Result<Self, FieldError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.domain().eq_ignore_ascii_case(domain))
            .ok_or_else(|| FieldError::InvalidKind(domain.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promise => "PROMISE",
            Self::Commit => "COMMIT",
        }
    }
}

impl std::fmt::Display for CommitmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitmentKind {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FieldError::InvalidKind(s.to_string()))
    }
}
