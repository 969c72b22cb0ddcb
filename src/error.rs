//! Error types shared by the quiz client
//!
//! Every failure the client can surface falls into one of a handful of
//! kinds. Remote failures carry the HTTP status when one was received.

use serde::Serialize;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// The categories of failure the client distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
pub enum ErrorKind {
    /// Network or transport failure, or a response that could not be understood
    ServiceUnavailable,
    /// Bad question count or out-of-range selection
    InvalidArgument,
    /// The session handle is unknown to the service
    NotFound,
    /// The session is already completed
    Conflict,
    /// The user declined a confirmation
    UserCancelled,
}

/// Failure of a single quiz service operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    /// What went wrong
    pub kind: ErrorKind,
    /// HTTP status, if the service answered at all
    pub status_code: Option<u16>,
    /// Human readable description
    pub message: String,
}

impl ServiceError {
    /// Creates an error for a transport failure with no status
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ServiceUnavailable,
            status_code: None,
            message: message.into(),
        }
    }

    /// Creates an error from a non-success HTTP status
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let kind = match status_code {
            400 | 422 => ErrorKind::InvalidArgument,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            _ => ErrorKind::ServiceUnavailable,
        };
        Self {
            kind,
            status_code: Some(status_code),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None => Self::unavailable(err.to_string()),
        }
    }
}

/// Errors surfaced by the controller and the composition root
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A quiz service operation failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// An intent carried an argument outside its allowed range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The user declined a confirmation
    #[error("Cancelled by user")]
    UserCancelled,
}

impl Error {
    /// Returns the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Service(err) => err.kind,
            Error::InvalidArgument(_) | Error::Config(_) => ErrorKind::InvalidArgument,
            Error::UserCancelled => ErrorKind::UserCancelled,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::from_status(400, "bad").kind,
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            ServiceError::from_status(404, "gone").kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::from_status(409, "done").kind,
            ErrorKind::Conflict
        );
        assert_eq!(
            ServiceError::from_status(500, "boom").kind,
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(ServiceError::from_status(503, "").status_code, Some(503));
    }

    #[test]
    fn test_unavailable_has_no_status() {
        let err = ServiceError::unavailable("connection refused");
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert_eq!(err.status_code, None);
        assert_eq!(err.to_string(), "ServiceUnavailable: connection refused");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::UserCancelled.kind(), ErrorKind::UserCancelled);
        assert_eq!(
            Error::InvalidArgument("x".to_string()).kind(),
            ErrorKind::InvalidArgument
        );
        let service: Error = ServiceError::from_status(409, "done").into();
        assert_eq!(service.kind(), ErrorKind::Conflict);
    }
}
