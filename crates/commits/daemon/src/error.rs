//! Error types for commitsd

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use commits_parser::ParseError;
use commits_storage::StorageError;
use commits_types::FieldError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A path that is not `user.promises.to/...` or `user.commits.to/...`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address '{0}' has no user.domain host")]
    MissingHost(String),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors from the parse → store → score pipeline.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Malformed address
    #[error("Bad address: {0}")]
    Address(#[from] AddressError),

    /// Pipeline error
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Address(AddressError::MissingHost(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_ADDRESS")
            }
            ApiError::Address(AddressError::Field(field))
            | ApiError::Service(ServiceError::Parse(ParseError::Field(field))) => match field {
                FieldError::InvalidUser(_) => (StatusCode::BAD_REQUEST, "INVALID_USER"),
                FieldError::InvalidKind(_) => (StatusCode::BAD_REQUEST, "INVALID_KIND"),
            },
            ApiError::Service(ServiceError::Parse(ParseError::MalformedEncoding { .. })) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_ENCODING")
            }
            ApiError::Service(ServiceError::Storage(storage)) => match storage {
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StorageError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                StorageError::Unavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
                }
                StorageError::Serialization(_) | StorageError::Backend(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Service(ServiceError::Storage(err))
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn input_errors_are_bad_requests() {
        let malformed = ParseError::MalformedEncoding {
            reason: "bad".into(),
        };
        assert_eq!(
            status(ApiError::Service(malformed.into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AddressError::Field(FieldError::InvalidKind("example.com".into())).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ApiError::Service(
                ParseError::Field(FieldError::InvalidUser("a b".into())).into()
            )),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_errors_map_by_kind() {
        assert_eq!(
            status(StorageError::NotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StorageError::Conflict("x".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StorageError::Unavailable("down".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(StorageError::Backend("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
