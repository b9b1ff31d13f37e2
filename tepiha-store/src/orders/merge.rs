//! Merge engine: last-write-wins with a status rank guard
//!
//! Every write path ends here. [`reconcile`] combines two copies of the same
//! order; [`merge_all`] and [`upsert`] apply it at collection granularity.
//!
//! # Guarantees
//!
//! - The merged status has the highest rank either input held.
//! - `reconcile(a, b, now)` and `reconcile(b, a, now)` agree on status and
//!   `updated_at`; `reconcile(x, x, now) == x`.
//! - When the rank guard overrides the newer copy, the result is stamped with
//!   `max(a.updated_at, b.updated_at, now)` so an older pending write cannot
//!   undo the correction.

use shared::Order;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Total precedence between two copies of one order.
///
/// Newer `updated_at` wins; on a timestamp tie the higher rank wins; on a full
/// tie the canonical JSON form decides so the choice never depends on argument
/// order.
fn precedence(a: &Order, b: &Order) -> Ordering {
    a.updated_at
        .cmp(&b.updated_at)
        .then_with(|| a.rank().cmp(&b.rank()))
        .then_with(|| canonical(a).cmp(&canonical(b)))
}

fn canonical(order: &Order) -> String {
    serde_json::to_string(order).unwrap_or_default()
}

/// Combine two copies of the same order (same `id`).
pub fn reconcile(a: &Order, b: &Order, now: i64) -> Order {
    debug_assert_eq!(a.id, b.id, "reconcile expects copies of one order");

    let (candidate, other) = if precedence(b, a) != Ordering::Less {
        (b, a)
    } else {
        (a, b)
    };

    let mut merged = candidate.clone();
    if candidate.rank() < other.rank() {
        tracing::debug!(
            order_id = %candidate.id,
            from = %candidate.status,
            kept = %other.status,
            "Refused status regression during merge"
        );
        merged.status = other.status;
        merged.updated_at = a.updated_at.max(b.updated_at).max(now);
    }
    merged
}

/// Insert `incoming` or reconcile it with the record that has the same id.
///
/// Returns the index of the stored record.
pub fn upsert(orders: &mut Vec<Order>, incoming: Order, now: i64) -> usize {
    match orders.iter().position(|o| o.id == incoming.id) {
        Some(index) => {
            orders[index] = reconcile(&orders[index], &incoming, now);
            index
        }
        None => {
            orders.push(incoming);
            orders.len() - 1
        }
    }
}

/// Merge two collections into one, reconciling records that share an id.
///
/// Output keeps first-seen order: records of `a`, then new ids from `b`.
/// Duplicate ids inside either input collapse as well.
pub fn merge_all(a: &[Order], b: &[Order], now: i64) -> Vec<Order> {
    let mut merged: Vec<Order> = Vec::with_capacity(a.len() + b.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(a.len() + b.len());

    for order in a.iter().chain(b.iter()) {
        match index.get(&order.id) {
            Some(&i) => merged[i] = reconcile(&merged[i], order, now),
            None => {
                index.insert(order.id.clone(), merged.len());
                merged.push(order.clone());
            }
        }
    }
    merged
}

/// Number of ids that appear more than once
pub fn duplicate_count(orders: &[Order]) -> usize {
    let mut seen = std::collections::HashSet::with_capacity(orders.len());
    orders.iter().filter(|o| !seen.insert(o.id.as_str())).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::OrderStatus;

    const NOW: i64 = 10_000;

    fn order(id: &str, status: OrderStatus, updated_at: i64) -> Order {
        let mut order: Order = serde_json::from_value(json!({"id": id})).unwrap();
        order.status = status;
        order.updated_at = updated_at;
        order
    }

    #[test]
    fn test_newer_wins_when_rank_not_lower() {
        let old = order("a", OrderStatus::Received, 100);
        let mut new = order("a", OrderStatus::Cleaning, 200);
        new.notes = "fresh".into();

        let merged = reconcile(&old, &new, NOW);
        assert_eq!(merged, new);
        assert_eq!(reconcile(&new, &old, NOW), new);
    }

    #[test]
    fn test_regression_is_refused_and_restamped() {
        let cleaning = order("a", OrderStatus::Cleaning, 100);
        let mut stale = order("a", OrderStatus::Received, 200);
        stale.notes = "edited".into();

        let merged = reconcile(&cleaning, &stale, NOW);
        assert_eq!(merged.status, OrderStatus::Cleaning);
        assert_eq!(merged.updated_at, NOW);
        // content follows the newer copy
        assert_eq!(merged.notes, "edited");
    }

    #[test]
    fn test_restamp_never_goes_back_in_time() {
        let delivered = order("a", OrderStatus::Delivered, 100);
        let stale = order("a", OrderStatus::Ready, 50_000);

        let merged = reconcile(&delivered, &stale, NOW);
        assert_eq!(merged.status, OrderStatus::Delivered);
        assert_eq!(merged.updated_at, 50_000);
    }

    #[test]
    fn test_reconcile_idempotent() {
        let x = order("a", OrderStatus::Ready, 123);
        assert_eq!(reconcile(&x, &x, NOW), x);
    }

    #[test]
    fn test_tie_prefers_higher_rank_both_ways() {
        let a = order("a", OrderStatus::Ready, 100);
        let b = order("a", OrderStatus::Cleaning, 100);

        let ab = reconcile(&a, &b, NOW);
        let ba = reconcile(&b, &a, NOW);
        assert_eq!(ab.status, OrderStatus::Ready);
        assert_eq!(ab.updated_at, 100);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_full_tie_is_deterministic() {
        let mut a = order("a", OrderStatus::Ready, 100);
        let mut b = order("a", OrderStatus::Ready, 100);
        a.notes = "alpha".into();
        b.notes = "beta".into();

        assert_eq!(reconcile(&a, &b, NOW), reconcile(&b, &a, NOW));
    }

    #[test]
    fn test_delivered_is_terminal_across_sequences() {
        let mut current = order("a", OrderStatus::Delivered, 100);
        let writes = [
            order("a", OrderStatus::Received, 500),
            order("a", OrderStatus::Cleaning, 900),
            order("a", OrderStatus::Ready, 20_000),
        ];
        let mut last_rank = current.rank();
        for (step, incoming) in writes.iter().enumerate() {
            current = reconcile(&current, incoming, NOW + step as i64);
            assert!(current.rank() >= last_rank);
            last_rank = current.rank();
        }
        assert_eq!(current.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_merge_all_commutative_on_status_and_timestamp() {
        let a = vec![
            order("1", OrderStatus::Cleaning, 100),
            order("2", OrderStatus::Ready, 300),
            order("3", OrderStatus::Received, 50),
        ];
        let b = vec![
            order("1", OrderStatus::Received, 200),
            order("2", OrderStatus::Delivered, 250),
            order("4", OrderStatus::Ready, 10),
            order("3", OrderStatus::Received, 50),
        ];

        let ab = merge_all(&a, &b, NOW);
        let ba = merge_all(&b, &a, NOW);
        assert_eq!(ab.len(), 4);
        assert_eq!(ba.len(), 4);
        for merged in &ab {
            let other = ba.iter().find(|o| o.id == merged.id).unwrap();
            assert_eq!(merged.status, other.status, "status differs for {}", merged.id);
            assert_eq!(merged.updated_at, other.updated_at, "updated_at differs for {}", merged.id);
        }

        let one = ab.iter().find(|o| o.id == "1").unwrap();
        assert_eq!(one.status, OrderStatus::Cleaning);
        assert_eq!(one.updated_at, NOW);
        let two = ab.iter().find(|o| o.id == "2").unwrap();
        assert_eq!(two.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_merge_all_keeps_first_seen_order() {
        let a = vec![order("x", OrderStatus::Received, 1), order("y", OrderStatus::Received, 1)];
        let b = vec![order("z", OrderStatus::Received, 1), order("x", OrderStatus::Ready, 2)];
        let ids: Vec<String> = merge_all(&a, &b, NOW).into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_merge_all_collapses_duplicates() {
        let a = vec![order("x", OrderStatus::Ready, 1), order("x", OrderStatus::Received, 5)];
        assert_eq!(duplicate_count(&a), 1);
        let merged = merge_all(&a, &[], NOW);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status, OrderStatus::Ready);
    }

    #[test]
    fn test_upsert_inserts_then_reconciles() {
        let mut orders = Vec::new();
        assert_eq!(upsert(&mut orders, order("a", OrderStatus::Ready, 10), NOW), 0);
        assert_eq!(upsert(&mut orders, order("b", OrderStatus::Received, 10), NOW), 1);
        assert_eq!(upsert(&mut orders, order("a", OrderStatus::Cleaning, 20), NOW), 0);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].status, OrderStatus::Ready);
        assert_eq!(orders[0].updated_at, NOW);
    }
}
