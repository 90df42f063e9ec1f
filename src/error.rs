//! Error types for deal operations
//!
//! Errors are classified by where the caller should look:
//! - Validation: the request itself is wrong, fix the input
//! - NotFound: the addressed record is absent from the targeted store
//! - RemoteUnavailable: the webhook source failed, reads fall back, writes surface
//! - Storage: the in-memory store broke an invariant (unexpected)

use thiserror::Error;

use crate::remote::client::RemoteError;

#[derive(Debug, Error)]
pub enum DealError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Deal not found: {0}")]
    NotFound(i64),

    #[error("Remote source unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DealError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DealError::Validation(_) => ErrorKind::Validation,
            DealError::NotFound(_) => ErrorKind::NotFound,
            DealError::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            DealError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns true if retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DealError::RemoteUnavailable(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DealError::Validation(_) => "Correct the highlighted fields and submit again.",
            DealError::NotFound(_) => "Refresh the pipeline; the deal may have been removed.",
            DealError::RemoteUnavailable(_) => {
                "The remote pipeline could not be reached. Retry the change in a moment."
            }
            DealError::Storage(_) => "Restart the service. This should not happen.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    NotFound,
    RemoteUnavailable,
    Storage,
}

/// Serializable error representation for HTTP responses and write reports
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub error_type: ErrorKind,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

impl From<&DealError> for ApiError {
    fn from(err: &DealError) -> Self {
        ApiError {
            message: err.to_string(),
            error_type: err.kind(),
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_network_error_is_retryable() {
        let err = DealError::from(RemoteError::Network("connection refused".into()));
        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_validation_is_not_retryable() {
        let err = DealError::Validation("clientName is required".into());
        assert!(!err.is_retryable());
        let api = ApiError::from(&err);
        assert_eq!(api.message, "Validation error: clientName is required");
        assert_eq!(api.error_type, ErrorKind::Validation);
    }

    #[test]
    fn test_api_error_serializes_camel_case() {
        let api = ApiError::from(&DealError::NotFound(42));
        let json = serde_json::to_value(&api).expect("serialize");
        assert_eq!(json["errorType"], "notFound");
        assert_eq!(json["canRetry"], false);
        assert!(json["recoverySuggestion"].as_str().is_some());
    }
}
