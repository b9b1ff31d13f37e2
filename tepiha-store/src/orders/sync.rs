//! Remote sync collaborators
//!
//! ```text
//!         ┌────────────────────┐
//!         │ RemoteOrders Trait │  ◄── pluggable fetch / push
//!         └────────┬───────────┘
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!     NoopRemote       MemoryRemote
//!     (offline)        (same process)
//! ```
//!
//! The wire protocol of a real remote belongs to its implementation. Whatever
//! it returns is merged through [`merge_all`](super::merge::merge_all), so the
//! order in which local writes and remote completions land does not change the
//! converged result.

use super::merge;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared::util::now_millis;
use shared::{AppError, Order};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Remote copy of the order collection
#[async_trait]
pub trait RemoteOrders: Send + Sync + std::fmt::Debug {
    /// Fetch the remote collection
    async fn fetch(&self) -> Result<Vec<Order>, AppError>;

    /// Push the merged local collection
    async fn push(&self, orders: &[Order]) -> Result<(), AppError>;
}

/// No remote configured: fetch returns nothing, push does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemote;

#[async_trait]
impl RemoteOrders for NoopRemote {
    async fn fetch(&self) -> Result<Vec<Order>, AppError> {
        Ok(Vec::new())
    }

    async fn push(&self, _orders: &[Order]) -> Result<(), AppError> {
        Ok(())
    }
}

/// In-process remote
///
/// Holds its own collection and merges every push into it, so two stores
/// sharing one `MemoryRemote` converge the same way two devices sharing a
/// server would.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    orders: Arc<RwLock<Vec<Order>>>,
    pushes: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(orders)),
            ..Self::default()
        }
    }

    /// Current remote collection
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders.read().clone()
    }

    /// Number of successful pushes
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Simulate an unreachable remote
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::remote("memory remote is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteOrders for MemoryRemote {
    async fn fetch(&self) -> Result<Vec<Order>, AppError> {
        self.ensure_online()?;
        Ok(self.snapshot())
    }

    async fn push(&self, orders: &[Order]) -> Result<(), AppError> {
        self.ensure_online()?;
        let mut remote = self.orders.write();
        *remote = merge::merge_all(&remote, orders, now_millis());
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
