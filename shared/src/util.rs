//! Helpers shared by both crates

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Money precision (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

/// Round to 2 decimals, half away from zero, via Decimal to avoid float drift
/// (`1.005` -> `1.01`).
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new order id: `ord_` + 8 random base36 chars + creation time in base36.
///
/// The random part comes from a v4 UUID, the suffix keeps ids roughly sortable
/// by creation time on a single device.
pub fn new_order_id() -> String {
    let random = uuid::Uuid::new_v4().as_u128();
    let mut id = String::from("ord_");
    id.push_str(&to_base36(random, Some(8)));
    id.push_str(&to_base36(now_millis().max(0) as u128, None));
    id
}

fn to_base36(mut value: u128, width: Option<usize>) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 || width.is_some_and(|w| out.len() >= w) {
            break;
        }
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_shape() {
        let id = new_order_id();
        assert!(id.starts_with("ord_"));
        assert!(id.len() > 12);
        assert!(id[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_order_ids_are_distinct() {
        let a = new_order_id();
        let b = new_order_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.5 * 3.2), 40.0);
        assert_eq!(round2(2.345), 2.35);
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0, None), "0");
        assert_eq!(to_base36(35, None), "z");
        assert_eq!(to_base36(36, None), "10");
    }
}
