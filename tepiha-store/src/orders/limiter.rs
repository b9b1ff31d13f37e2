//! Client activity limiter
//!
//! Caps the number of active (not delivered) orders one client may hold. A
//! client is identified by the composite key of folded name and digits-only
//! phone; there is no separate client record.

use shared::Order;
use shared::order::normalize::{client_key, digits_only, fold_name};
use thiserror::Error;

pub const DEFAULT_MAX_ACTIVE_PER_CLIENT: usize = 1;

/// Creation refused: the client already holds `count` active orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("client already has {count} active orders (max {max})")]
pub struct LimitExceeded {
    pub count: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientLimiter {
    max_active: usize,
}

impl Default for ClientLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTIVE_PER_CLIENT)
    }
}

impl ClientLimiter {
    pub fn new(max_active: usize) -> Self {
        Self { max_active }
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Active orders whose client key matches `name` + `phone`.
    ///
    /// `noShow` does not matter here, it only hides orders from lists.
    pub fn active_count_for(&self, orders: &[Order], name: &str, phone: &str) -> usize {
        let key = client_key(name, phone);
        orders
            .iter()
            .filter(|o| o.is_active() && o.client_key() == key)
            .count()
    }

    /// Refuse creation when the client is at the limit.
    ///
    /// A client with an empty name or phone (after normalization) is not
    /// identifiable and never limited.
    pub fn check(&self, orders: &[Order], name: &str, phone: &str) -> Result<(), LimitExceeded> {
        if fold_name(name).is_empty() || digits_only(phone).is_empty() {
            return Ok(());
        }

        let count = self.active_count_for(orders, name, phone);
        if count >= self.max_active {
            tracing::warn!(count, max = self.max_active, "Client activity limit reached");
            return Err(LimitExceeded {
                count,
                max: self.max_active,
            });
        }
        Ok(())
    }
}
