use thiserror::Error;

/// A structural field taken from the address failed its format constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("invalid user '{0}': expected one or more of [A-Za-z0-9_-]")]
    InvalidUser(String),

    #[error("invalid kind '{0}': expected promises.to or commits.to")]
    InvalidKind(String),
}
