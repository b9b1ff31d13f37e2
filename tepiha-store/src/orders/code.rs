//! Human-facing order codes (`X001`, `X002`, ...)

use shared::Order;
use shared::order::normalize::{code_number, format_code};

/// Highest code number held by any record (0 if none parse)
pub fn max_number(orders: &[Order]) -> u64 {
    orders
        .iter()
        .map(|o| code_number(&o.code))
        .max()
        .unwrap_or(0)
}

/// Next code number from a snapshot of the collection
pub fn next_number(orders: &[Order]) -> u64 {
    max_number(orders).saturating_add(1)
}

/// Next code from a snapshot of the collection.
///
/// Pure read: nothing is reserved. Creation goes through
/// [`Slot::reserve_code`](super::storage::Slot::reserve_code) instead.
pub fn next_code(orders: &[Order]) -> String {
    format_code(next_number(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_codes(codes: &[&str]) -> Vec<Order> {
        codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                serde_json::from_value(serde_json::json!({"id": format!("ord_{i}"), "code": code}))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_next_after_gaps() {
        let orders = with_codes(&["X001", "X007", "X003"]);
        assert_eq!(next_code(&orders), "X008");
    }

    #[test]
    fn test_empty_collection_starts_at_one() {
        assert_eq!(next_code(&[]), "X001");
    }

    #[test]
    fn test_malformed_codes_count_as_zero() {
        let orders = with_codes(&["", "X", "abc", "X000"]);
        assert_eq!(max_number(&orders), 0);
        assert_eq!(next_code(&orders), "X001");
    }

    #[test]
    fn test_wide_codes_not_truncated() {
        let orders = with_codes(&["X999", "x0042"]);
        assert_eq!(next_code(&orders), "X1000");
    }

    #[test]
    fn test_oversized_code_ignored() {
        let orders = with_codes(&["X18446744073709551615", "X004"]);
        assert_eq!(max_number(&orders), 4);
        assert_eq!(next_code(&orders), "X005");
    }
}
