//! Order record model
//!
//! - [`Order`]: the single persisted entity
//! - [`OrderStatus`]: lifecycle with a strict rank order
//! - [`NewOrder`] / [`OrderEdits`]: write inputs from the intake and edit forms
//! - [`normalize`]: folding rules for names, phones and codes

pub mod lenient;
pub mod normalize;
pub mod status;
pub mod types;

// Re-exports
pub use status::{OrderStatus, UnknownStatus};
pub use types::{NewOrder, Order, OrderEdits, OrderFlags, RESERVED_KEYS};
