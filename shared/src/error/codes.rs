//! Numeric error codes
//!
//! - 4xxx: order rules a caller is expected to handle
//! - 9xxx: environment faults (storage engine, remote)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code, serialized as its `u16` value so a UI can map it to localized
/// text without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 4xxx: Order ====================
    /// Client already holds the maximum number of active orders
    ClientLimitExceeded = 4002,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Storage engine error
    StorageError = 9100,
    /// Storage engine reports a damaged database file
    StorageCorrupted = 9101,
    /// Remote fetch or push failed
    RemoteSyncFailed = 9200,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::ClientLimitExceeded,
        ErrorCode::InternalError,
        ErrorCode::StorageError,
        ErrorCode::StorageCorrupted,
        ErrorCode::RemoteSyncFailed,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default English message, used when no specific message is given
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ClientLimitExceeded => {
                "Client already has the maximum number of active orders"
            }
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::StorageCorrupted => "Database file is damaged",
            ErrorCode::RemoteSyncFailed => "Remote synchronization failed",
        }
    }

    /// Environment faults, as opposed to rule violations
    pub const fn is_system(&self) -> bool {
        self.code() >= 9000
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
