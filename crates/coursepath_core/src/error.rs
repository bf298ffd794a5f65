//! Request-boundary error envelope.
//!
//! # Responsibility
//! - Classify every service error into a small, stable set of kinds.
//! - Build the structured error returned to callers.
//!
//! # Invariants
//! - `ErrorKind::Internal` never exposes the underlying error text; the
//!   cause is logged instead.
//! - Kind codes are stable snake_case strings.

use crate::db::{now_epoch_ms, DbError};
use crate::repo::RepoError;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown course, subtopic, enrollment or user.
    NotFound,
    /// Duplicate enrollment or duplicate email.
    Conflict,
    /// Action not permitted given the current enrollment state.
    Forbidden,
    /// Authentication failure.
    InvalidCredentials,
    /// Malformed input.
    Validation,
    /// Anything unclassified (storage, hashing, corrupted rows).
    Internal,
}

impl ErrorKind {
    /// Stable code used in serialized responses.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Implemented by every service error so the boundary can classify it.
pub trait ClassifyError: Error {
    fn kind(&self) -> ErrorKind;
}

impl ClassifyError for DbError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

impl ClassifyError for RepoError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Structured error returned at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    /// Epoch ms when the error was produced.
    pub timestamp: i64,
}

impl ErrorResponse {
    /// Builds the response for `err`, logging it at a level matching its kind.
    pub fn from_error<E: ClassifyError + ?Sized>(err: &E) -> Self {
        let kind = err.kind();
        let message = match kind {
            ErrorKind::Internal => {
                error!(
                    "event=request_failed module=boundary status=error kind={} error={}",
                    kind, err
                );
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            _ => {
                warn!(
                    "event=request_rejected module=boundary status=rejected kind={}",
                    kind
                );
                err.to_string()
            }
        };

        Self {
            error: kind,
            message,
            timestamp: now_epoch_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassifyError, ErrorKind, ErrorResponse};
    use std::error::Error;
    use std::fmt::{Display, Formatter};

    #[derive(Debug)]
    struct Fake(ErrorKind, &'static str);

    impl Display for Fake {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.1)
        }
    }

    impl Error for Fake {}

    impl ClassifyError for Fake {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = ErrorResponse::from_error(&Fake(
            ErrorKind::Internal,
            "disk I/O error at /var/db/secret.sqlite3",
        ));
        assert_eq!(response.error, ErrorKind::Internal);
        assert!(!response.message.contains("secret"));
        assert_eq!(response.message, "An unexpected error occurred");
    }

    #[test]
    fn classified_errors_keep_message_and_code() {
        let response =
            ErrorResponse::from_error(&Fake(ErrorKind::Conflict, "already enrolled"));
        assert_eq!(response.message, "already enrolled");
        assert!(response.timestamp > 0);

        let json = serde_json::to_value(&response).expect("serialize error response");
        assert_eq!(json["error"], "conflict");
    }
}
