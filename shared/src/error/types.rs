//! Error type carried across the store boundary

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is what collaborators (UI, transport) see. Store-internal error enums
/// convert into it so the caller can branch on [`ErrorCode`] and read details
/// such as the current active-order count.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Read a detail entry back
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    // ==================== Convenience constructors ====================

    /// Create a client-limit error with the current count and configured maximum
    pub fn client_limit_exceeded(count: usize, max: usize) -> Self {
        Self::with_message(
            ErrorCode::ClientLimitExceeded,
            format!("Client already has {count} active order(s); at most {max} allowed"),
        )
        .with_detail("count", count)
        .with_detail("max", max)
    }

    /// Create a remote sync error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::RemoteSyncFailed, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::RemoteSyncFailed);
        assert_eq!(err.message, "Remote synchronization failed");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_client_limit_details() {
        let err = AppError::client_limit_exceeded(1, 1);
        assert_eq!(err.code, ErrorCode::ClientLimitExceeded);
        assert_eq!(err.detail("count"), Some(&Value::from(1)));
        assert_eq!(err.detail("max"), Some(&Value::from(1)));
        assert!(err.to_string().contains("1 active order"));
    }

    #[test]
    fn test_serialize_skips_empty_details() {
        let json = serde_json::to_value(AppError::internal("boom")).unwrap();
        assert_eq!(json["code"], 9001);
        assert!(json.get("details").is_none());
    }
}
