//! Shared types for Tepiha
//!
//! The persisted order record, its status lattice, text normalization used by
//! search and the client limiter, and the unified error codes.

pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use order::{NewOrder, Order, OrderEdits, OrderFlags, OrderStatus};
