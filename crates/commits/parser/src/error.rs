use commits_types::FieldError;
use thiserror::Error;

/// Errors that reject a single parse request. No record is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The raw expression contains an invalid percent-escape.
    #[error("malformed encoding: {reason}")]
    MalformedEncoding { reason: String },

    /// `user` or `kind` failed validation.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// The date resolver could not be invoked at all.
///
/// Distinct from "no date found", which is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// Invalid parser configuration.
#[derive(Debug, Error)]
pub enum ParserConfigError {
    #[error("deadline keywords and completion markers must not be blank")]
    BlankWord,

    #[error("utc offset of {0} minutes is out of range")]
    InvalidOffset(i32),

    #[error("keyword pattern: {0}")]
    Pattern(#[from] regex::Error),
}
