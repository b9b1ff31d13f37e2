//! Startup migration pass
//!
//! Runs once per process, right after the store is opened and before anything
//! else reads the collection. Shape repairs (status case, legacy keys, missing
//! ids) already happened in [`codec::decode`](super::codec::decode); this pass
//! fixes timestamps and collapses duplicate ids.
//!
//! Re-running it with the same `now` changes nothing.

use super::merge;
use shared::{Order, OrderStatus};

/// Default grace window for the ready refresh (5 s)
pub const DEFAULT_READY_GRACE_MS: i64 = 5_000;

/// What the pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records after the pass
    pub records: usize,
    /// Records that had no `updatedAt`
    pub backfilled: usize,
    /// Ready records whose `updatedAt` was moved to now
    pub refreshed: usize,
    /// Duplicate ids folded into one record
    pub duplicates_merged: usize,
}

impl MigrationReport {
    pub fn changed(&self) -> bool {
        self.backfilled > 0 || self.refreshed > 0 || self.duplicates_merged > 0
    }
}

/// Migrate the collection in place.
pub fn migrate(orders: &mut Vec<Order>, now: i64, ready_grace_ms: i64) -> MigrationReport {
    let mut report = MigrationReport::default();

    for order in orders.iter_mut() {
        if order.updated_at <= 0 {
            order.updated_at = if order.created_at > 0 {
                order.created_at
            } else {
                now
            };
            report.backfilled += 1;
        }

        // ready before timestamps existed: do not look stale next to fresh writes
        if order.status == OrderStatus::Ready && order.updated_at < now - ready_grace_ms {
            order.updated_at = now;
            report.refreshed += 1;
        }
    }

    report.duplicates_merged = merge::duplicate_count(orders);
    if report.duplicates_merged > 0 {
        tracing::warn!(count = report.duplicates_merged, "Collapsing duplicate order ids");
        *orders = merge::merge_all(orders, &[], now);
    }

    report.records = orders.len();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_000_000;

    fn order(value: serde_json::Value) -> Order {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_backfill_from_created_at_or_now() {
        let mut orders = vec![
            order(json!({"id": "1", "status": "received", "ts": 500})),
            order(json!({"id": "2", "status": "cleaning"})),
        ];
        let report = migrate(&mut orders, NOW, DEFAULT_READY_GRACE_MS);
        assert_eq!(report.backfilled, 2);
        assert_eq!(orders[0].updated_at, 500);
        assert_eq!(orders[1].updated_at, NOW);
    }

    #[test]
    fn test_stale_ready_refreshed() {
        let mut orders = vec![
            order(json!({"id": "1", "status": "ready", "updatedAt": NOW - 60_000})),
            order(json!({"id": "2", "status": "ready", "updatedAt": NOW - 1_000})),
            order(json!({"id": "3", "status": "cleaning", "updatedAt": NOW - 60_000})),
        ];
        let report = migrate(&mut orders, NOW, DEFAULT_READY_GRACE_MS);
        assert_eq!(report.refreshed, 1);
        assert_eq!(orders[0].updated_at, NOW);
        assert_eq!(orders[1].updated_at, NOW - 1_000);
        assert_eq!(orders[2].updated_at, NOW - 60_000);
    }

    #[test]
    fn test_ready_without_timestamp_backfilled_then_refreshed() {
        let mut orders = vec![order(json!({"id": "1", "status": "ready", "ts": 10}))];
        let report = migrate(&mut orders, NOW, DEFAULT_READY_GRACE_MS);
        assert_eq!(report.backfilled, 1);
        assert_eq!(report.refreshed, 1);
        assert_eq!(orders[0].updated_at, NOW);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let mut orders = vec![
            order(json!({"id": "1", "status": "delivered", "updatedAt": NOW})),
            order(json!({"id": "2", "status": "received", "updatedAt": NOW})),
            order(json!({"id": "1", "status": "cleaning", "updatedAt": NOW + 1})),
        ];
        let report = migrate(&mut orders, NOW, DEFAULT_READY_GRACE_MS);
        assert_eq!(report.duplicates_merged, 1);
        assert_eq!(report.records, 2);
        assert_eq!(orders[0].id, "1");
        assert_eq!(orders[0].status, OrderStatus::Delivered);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let mut orders = vec![
            order(json!({"id": "1", "status": "ready", "ts": 10})),
            order(json!({"id": "2", "status": "received"})),
            order(json!({"id": "2", "status": "cleaning", "updatedAt": 3})),
        ];
        assert!(migrate(&mut orders, NOW, DEFAULT_READY_GRACE_MS).changed());

        let snapshot = orders.clone();
        let again = migrate(&mut orders, NOW, DEFAULT_READY_GRACE_MS);
        assert!(!again.changed());
        assert_eq!(orders, snapshot);
    }
}
