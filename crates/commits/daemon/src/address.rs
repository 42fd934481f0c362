//! Splitting `user.promises.to/expression` addresses.

use commits_types::{CommitmentKind, UserHandle};

use crate::error::AddressError;

/// An address as typed after the host: `bob.promises.to/call-mom-by-friday`.
///
/// The expression is kept exactly as it appeared in the request path,
/// percent-escapes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentAddress {
    pub user: UserHandle,
    pub kind: CommitmentKind,
    pub raw_expression: String,
}

impl CommitmentAddress {
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let (host, raw_expression) = address.split_once('/').unwrap_or((address, ""));
        let (user, domain) = host
            .split_once('.')
            .ok_or_else(|| AddressError::MissingHost(address.to_string()))?;

        Ok(Self {
            kind: CommitmentKind::from_domain(domain)?,
            user: UserHandle::parse(user)?,
            raw_expression: raw_expression.to_string(),
        })
    }
}

impl std::fmt::Display for CommitmentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}/{}", self.user, self.kind.domain(), self.raw_expression)
    }
}
