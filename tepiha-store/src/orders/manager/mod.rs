//! OrdersManager - the order store service
//!
//! This module handles:
//! - Opening the store and running the startup migration once
//! - Order creation (limit check, code reservation, insert) in one transaction
//! - Status changes and field edits, always merged against the stored record
//! - Bulk writes from any source, merged against the current collection
//! - Read-side queries: search, status lists, client activity
//! - Remote sync through a pluggable [`RemoteOrders`]
//!
//! # Write Flow
//!
//! ```text
//! put / write / create_order / set_status / apply_edits
//!     ├─ 1. Begin redb write transaction
//!     ├─ 2. Decode current collection (corrupt content -> empty)
//!     ├─ 3. Build the incoming record(s)
//!     ├─ 4. reconcile / merge_all against what is stored
//!     ├─ 5. Encode and commit (skipped when nothing changed)
//!     └─ 6. Return the stored result
//! ```
//!
//! There is no path that replaces the collection without merging, so the
//! rank guard holds whoever the writer is.

mod error;
pub use error::*;

use super::limiter::ClientLimiter;
use super::merge;
use super::migration::{self, MigrationReport};
use super::search;
use super::storage::OrderStorage;
use super::sync::{NoopRemote, RemoteOrders};
use crate::core::StoreConfig;
use shared::order::normalize::format_code;
use shared::util::{new_order_id, now_millis};
use shared::{NewOrder, Order, OrderEdits, OrderStatus};
use std::path::Path;
use std::sync::Arc;

/// Timestamp for a local write on top of `existing`.
///
/// Strictly newer than what is stored, so the write wins last-write-wins even
/// if the wall clock went backwards.
fn write_stamp(existing: &Order, now: i64) -> i64 {
    now.max(existing.updated_at.saturating_add(1))
}

/// Order store service
#[derive(Clone)]
pub struct OrdersManager {
    storage: OrderStorage,
    config: StoreConfig,
    limiter: ClientLimiter,
    remote: Arc<dyn RemoteOrders>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("config", &self.config)
            .field("remote", &self.remote)
            .finish()
    }
}

impl OrdersManager {
    /// Open the store at `db_path` and run the migration pass
    pub fn open(db_path: impl AsRef<Path>, config: StoreConfig) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        let manager = Self::with_storage(storage, config);
        manager.run_migration()?;
        tracing::info!(
            max_active_per_client = config.max_active_per_client,
            "OrdersManager started"
        );
        Ok(manager)
    }

    /// Create a manager over existing storage. The migration pass is not run.
    pub fn with_storage(storage: OrderStorage, config: StoreConfig) -> Self {
        Self {
            storage,
            config,
            limiter: ClientLimiter::new(config.max_active_per_client),
            remote: Arc::new(NoopRemote),
        }
    }

    /// Replace the remote collaborator used by [`sync`](Self::sync)
    pub fn with_remote(mut self, remote: Arc<dyn RemoteOrders>) -> Self {
        self.remote = remote;
        self
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    /// Normalize the stored collection.
    ///
    /// Writes only when something changed or the stored document was in an
    /// older schema, repaired, or corrupt.
    pub fn run_migration(&self) -> ManagerResult<MigrationReport> {
        let now = now_millis();
        let grace = self.config.ready_grace_ms;

        self.storage.modify(|slot| {
            let mut orders = slot.orders().to_vec();
            let report = migration::migrate(&mut orders, now, grace);

            if report.changed() {
                *slot.orders_mut() = orders;
            } else if slot.decoded().needs_rewrite() {
                slot.mark_dirty();
            }

            let decoded = slot.decoded();
            if report.changed() || decoded.needs_rewrite() {
                tracing::info!(
                    records = report.records,
                    backfilled = report.backfilled,
                    refreshed = report.refreshed,
                    duplicates = report.duplicates_merged,
                    repaired = decoded.repaired,
                    set_aside = decoded.rejected.len(),
                    corrupt = decoded.is_corrupt(),
                    "Migration rewrote stored orders"
                );
            }
            Ok::<_, ManagerError>(report)
        })
    }

    // ========== Reads ==========

    /// Current collection. Corrupt or missing content reads as empty.
    pub fn load(&self) -> ManagerResult<Vec<Order>> {
        Ok(self.storage.load()?.orders)
    }

    pub fn get_by_id(&self, id: &str) -> ManagerResult<Option<Order>> {
        Ok(self.load()?.into_iter().find(|o| o.id == id))
    }

    pub fn search(&self, query: &str) -> ManagerResult<Vec<Order>> {
        Ok(search::search(&self.load()?, query))
    }

    /// Orders in `status`, excluding no-shows
    pub fn list_by_status(&self, status: OrderStatus) -> ManagerResult<Vec<Order>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|o| o.status == status && o.is_listed())
            .collect())
    }

    pub fn list_cleaning(&self) -> ManagerResult<Vec<Order>> {
        self.list_by_status(OrderStatus::Cleaning)
    }

    pub fn list_ready(&self) -> ManagerResult<Vec<Order>> {
        self.list_by_status(OrderStatus::Ready)
    }

    /// Ready orders flagged for same-day pickup
    pub fn list_ready_today(&self) -> ManagerResult<Vec<Order>> {
        Ok(self
            .list_ready()?
            .into_iter()
            .filter(|o| o.flags.ready_today)
            .collect())
    }

    pub fn active_count_for(&self, name: &str, phone: &str) -> ManagerResult<usize> {
        Ok(self.limiter.active_count_for(&self.load()?, name, phone))
    }

    /// Fail with `ClientLimitExceeded` if the client is at the limit
    pub fn enforce_limit(&self, name: &str, phone: &str) -> ManagerResult<()> {
        self.limiter.check(&self.load()?, name, phone)?;
        Ok(())
    }

    /// The code the next reservation would hand out (nothing is reserved)
    pub fn peek_next_code(&self) -> ManagerResult<String> {
        let decoded = self.storage.load()?;
        let counter = self.storage.code_counter()?;
        let next = super::code::max_number(&decoded.orders)
            .max(counter)
            .saturating_add(1);
        Ok(format_code(next))
    }

    // ========== Writes ==========

    /// Reserve the next code. Never hands out the same code twice.
    pub fn reserve_code(&self) -> ManagerResult<String> {
        self.storage
            .modify(|slot| Ok::<_, ManagerError>(format_code(slot.reserve_code())))
    }

    /// Insert `order`, or reconcile it with the stored record of the same id.
    ///
    /// Returns the record as stored.
    pub fn put(&self, order: Order) -> ManagerResult<Order> {
        let now = now_millis();
        self.storage.modify(|slot| {
            let index = merge::upsert(slot.orders_mut(), order, now);
            Ok::<_, ManagerError>(slot.orders()[index].clone())
        })
    }

    /// Write a whole collection from any source.
    ///
    /// The incoming records are merged with what is stored, never written
    /// over it. Returns the merged collection.
    pub fn write(&self, incoming: &[Order]) -> ManagerResult<Vec<Order>> {
        let now = now_millis();
        self.storage.modify(|slot| {
            let merged = merge::merge_all(slot.orders(), incoming, now);
            if merged.as_slice() != slot.orders() {
                *slot.orders_mut() = merged.clone();
            }
            Ok::<_, ManagerError>(merged)
        })
    }

    /// Create an order for a walk-in client.
    ///
    /// Limit check, code reservation and insert share one transaction: a
    /// rejected creation reserves nothing.
    pub fn create_order(&self, input: NewOrder) -> ManagerResult<Order> {
        let now = now_millis();
        let order = self.storage.modify(|slot| -> ManagerResult<Order> {
            self.limiter
                .check(slot.orders(), &input.client_name, &input.client_phone)?;

            let code = format_code(slot.reserve_code());
            let order = Order::from_new(input, new_order_id(), code, now);
            let index = merge::upsert(slot.orders_mut(), order, now);
            Ok(slot.orders()[index].clone())
        })?;

        tracing::info!(order_id = %order.id, code = %order.code, "Order created");
        Ok(order)
    }

    /// Move an order to `status`.
    ///
    /// Unknown id: `Ok(None)`. Same status: no write. A lower-ranked status is
    /// refused by the merge; the record keeps its status and the refusal is
    /// logged.
    pub fn set_status(&self, id: &str, status: OrderStatus) -> ManagerResult<Option<Order>> {
        let now = now_millis();
        self.storage.modify(|slot| -> ManagerResult<Option<Order>> {
            let Some(existing) = slot.orders().iter().find(|o| o.id == id).cloned() else {
                tracing::debug!(order_id = %id, "set_status on unknown order ignored");
                return Ok(None);
            };
            if existing.status == status {
                return Ok(Some(existing));
            }
            if status.rank() < existing.rank() {
                tracing::warn!(
                    order_id = %id,
                    current = %existing.status,
                    requested = %status,
                    "Status regression refused"
                );
            }

            let mut incoming = existing.clone();
            incoming.status = status;
            incoming.updated_at = write_stamp(&existing, now);

            let index = merge::upsert(slot.orders_mut(), incoming, now);
            Ok(Some(slot.orders()[index].clone()))
        })
    }

    /// Apply a field edit without touching status.
    ///
    /// Unknown id: `Ok(None)`.
    pub fn apply_edits(&self, id: &str, edits: OrderEdits) -> ManagerResult<Option<Order>> {
        let now = now_millis();
        self.storage.modify(|slot| -> ManagerResult<Option<Order>> {
            let Some(existing) = slot.orders().iter().find(|o| o.id == id).cloned() else {
                tracing::debug!(order_id = %id, "apply_edits on unknown order ignored");
                return Ok(None);
            };

            let mut incoming = existing.clone();
            incoming.apply_edits(edits);
            incoming.status = existing.status;
            incoming.updated_at = write_stamp(&existing, now);

            let index = merge::upsert(slot.orders_mut(), incoming, now);
            Ok(Some(slot.orders()[index].clone()))
        })
    }

    // ========== Sync ==========

    /// Fetch the remote collection, merge it into the store, push the result.
    ///
    /// A failed fetch leaves the store untouched. A failed push happens after
    /// the merge is persisted; the next sync pushes again.
    pub async fn sync(&self) -> ManagerResult<Vec<Order>> {
        let remote_orders = self.remote.fetch().await.map_err(ManagerError::Remote)?;
        let fetched = remote_orders.len();

        let merged = self.write(&remote_orders)?;

        self.remote
            .push(&merged)
            .await
            .map_err(ManagerError::Remote)?;

        tracing::info!(fetched, total = merged.len(), "Sync complete");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests;
