//! Unified error system for Tepiha
//!
//! - [`ErrorCode`]: numeric codes a UI can localize
//! - [`AppError`]: code + message + structured details
//!
//! Only [`ErrorCode::ClientLimitExceeded`] is expected in normal operation.
//! Corrupt storage content, malformed numbers and unknown ids are absorbed by
//! the store and never reach the caller as errors.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::client_limit_exceeded(1, 1);
//! assert_eq!(err.code, ErrorCode::ClientLimitExceeded);
//! ```

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
