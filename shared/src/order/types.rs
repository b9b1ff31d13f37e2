//! The persisted order record and its write inputs
//!
//! Field names on the wire follow the layout existing device data already uses
//! (`client_name`, `pay_m2`, `pay_euro`, `ts`, `updatedAt`). Fields this crate
//! does not know about are kept in `extra` and written back untouched.

use super::lenient;
use super::normalize;
use super::status::OrderStatus;
use crate::util::round2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys an edit payload may never overwrite.
pub const RESERVED_KEYS: [&str; 6] = ["id", "code", "status", "ts", "createdAt", "updatedAt"];

// ============================================================================
// Order
// ============================================================================

/// Display flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlags {
    /// Narrows the ready list to same-day pickups
    #[serde(default, deserialize_with = "lenient::bool")]
    pub ready_today: bool,
    /// Hides the order from every status list without touching its status
    #[serde(default, deserialize_with = "lenient::bool")]
    pub no_show: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A service order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Merge key, immutable
    pub id: String,
    /// Human-facing code (`X008`)
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default)]
    pub status: OrderStatus,
    /// Creation time (unix millis)
    #[serde(rename = "ts", default, deserialize_with = "lenient::i64")]
    pub created_at: i64,
    /// Last write time (unix millis), authoritative for last-write-wins.
    /// `0` means the record predates timestamp tracking.
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient::i64")]
    pub updated_at: i64,

    #[serde(default, deserialize_with = "lenient::string")]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub client_phone: String,
    /// Free-text reference, not used by any invariant
    #[serde(default, deserialize_with = "lenient::string")]
    pub client_code: String,

    /// Price per m²
    #[serde(default, deserialize_with = "lenient::f64")]
    pub pay_rate: f64,
    /// Area processed (m²)
    #[serde(rename = "pay_m2", default, deserialize_with = "lenient::f64")]
    pub pay_area: f64,
    /// round2(pay_rate × pay_area) at creation; only changed by explicit edits
    #[serde(rename = "pay_euro", default, deserialize_with = "lenient::f64")]
    pub pay_total: f64,

    /// Line items, owned by the totals widget
    #[serde(default, deserialize_with = "lenient::list")]
    pub pieces: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient::flags")]
    pub flags: OrderFlags,

    /// Unknown fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    /// Build a freshly received order from intake input.
    pub fn from_new(input: NewOrder, id: String, code: String, now: i64) -> Self {
        let pay_total = round2(input.pay_rate * input.pay_area);
        Self {
            id,
            code,
            status: OrderStatus::Received,
            created_at: now,
            updated_at: now,
            client_name: input.client_name,
            client_phone: input.client_phone,
            client_code: input.client_code,
            pay_rate: input.pay_rate,
            pay_area: input.pay_area,
            pay_total,
            pieces: input.pieces,
            notes: input.notes,
            flags: OrderFlags::default(),
            extra: Map::new(),
        }
    }

    pub fn rank(&self) -> u8 {
        self.status.rank()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Composite client key used by the activity limiter
    pub fn client_key(&self) -> String {
        normalize::client_key(&self.client_name, &self.client_phone)
    }

    /// Normalized code suffix (`X007` -> `7`)
    pub fn code_suffix(&self) -> String {
        normalize::code_suffix(&self.code)
    }

    /// Visible in status lists (not flagged as no-show)
    pub fn is_listed(&self) -> bool {
        !self.flags.no_show
    }

    /// Apply a field edit. Status, id, code and timestamps are never touched here.
    pub fn apply_edits(&mut self, edits: OrderEdits) {
        let OrderEdits {
            client_name,
            client_phone,
            client_code,
            pay_rate,
            pay_area,
            pay_total,
            pieces,
            notes,
            flags,
            extra,
        } = edits;

        if let Some(v) = client_name {
            self.client_name = v;
        }
        if let Some(v) = client_phone {
            self.client_phone = v;
        }
        if let Some(v) = client_code {
            self.client_code = v;
        }
        if let Some(v) = pay_rate {
            self.pay_rate = v;
        }
        if let Some(v) = pay_area {
            self.pay_area = v;
        }
        if let Some(v) = pay_total {
            self.pay_total = v;
        }
        if let Some(v) = pieces {
            self.pieces = v;
        }
        if let Some(v) = notes {
            self.notes = v;
        }
        if let Some(v) = flags {
            self.flags = v;
        }
        for (key, value) in extra {
            if RESERVED_KEYS.contains(&key.as_str()) {
                tracing::debug!(order_id = %self.id, key = %key, "Ignoring reserved key in edit");
                continue;
            }
            self.extra.insert(key, value);
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Intake form input for a new order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewOrder {
    #[serde(deserialize_with = "lenient::string")]
    pub client_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub client_phone: String,
    #[serde(deserialize_with = "lenient::string")]
    pub client_code: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub pay_rate: f64,
    #[serde(rename = "pay_m2", deserialize_with = "lenient::f64")]
    pub pay_area: f64,
    #[serde(deserialize_with = "lenient::list")]
    pub pieces: Vec<Value>,
    #[serde(deserialize_with = "lenient::string")]
    pub notes: String,
}

/// Partial edit from the order form
///
/// Every field is optional; absent fields are left alone. Keys the form sends
/// that are not listed here land in `extra` and are stored as-is, except the
/// [`RESERVED_KEYS`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderEdits {
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub pay_rate: Option<f64>,
    #[serde(rename = "pay_m2", deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub pay_area: Option<f64>,
    #[serde(rename = "pay_euro", deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub pay_total: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_list", skip_serializing_if = "Option::is_none")]
    pub pieces: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_flags", skip_serializing_if = "Option::is_none")]
    pub flags: Option<OrderFlags>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_record() -> Value {
        json!({
            "id": "ord_abc",
            "code": "X007",
            "status": "gati",
            "ts": 1_700_000_000_000i64,
            "updatedAt": 1_700_000_100_000i64,
            "client_name": "Agim Berisha",
            "client_phone": "044123456",
            "client_code": "",
            "pay_rate": "2.5",
            "pay_m2": 10,
            "pay_euro": 25.0,
            "pieces": [{"m2": 4.0}, {"m2": 6.0}],
            "notes": "",
            "flags": {"readyToday": true, "noShow": false},
            "clientPaid": 10
        })
    }

    #[test]
    fn test_decode_legacy_record() {
        let order: Order = serde_json::from_value(legacy_record()).unwrap();
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.pay_rate, 2.5);
        assert_eq!(order.pay_area, 10.0);
        assert!(order.flags.ready_today);
        assert_eq!(order.extra.get("clientPaid"), Some(&json!(10)));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let order: Order = serde_json::from_value(legacy_record()).unwrap();
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["clientPaid"], json!(10));
        assert_eq!(value["pay_m2"], json!(10.0));
        assert_eq!(value["status"], json!("ready"));
    }

    #[test]
    fn test_defaults_applied() {
        let order: Order = serde_json::from_value(json!({"id": "ord_1"})).unwrap();
        assert_eq!(order.status, OrderStatus::Received);
        assert_eq!(order.updated_at, 0);
        assert!(order.pieces.is_empty());
        assert!(!order.flags.no_show);
    }

    #[test]
    fn test_malformed_flags_keep_record() {
        for flags in [json!(null), json!("broken"), json!(7)] {
            let order: Order = serde_json::from_value(json!({
                "id": "ord_keep",
                "status": "cleaning",
                "flags": flags,
                "clientPaid": 5
            }))
            .unwrap();
            assert_eq!(order.id, "ord_keep");
            assert_eq!(order.status, OrderStatus::Cleaning);
            assert_eq!(order.flags, OrderFlags::default());
            assert_eq!(order.extra.get("clientPaid"), Some(&json!(5)));
        }
    }

    #[test]
    fn test_from_new_computes_total() {
        let input = NewOrder {
            client_name: "Agim".into(),
            pay_rate: 2.5,
            pay_area: 12.34,
            ..Default::default()
        };
        let order = Order::from_new(input, "ord_1".into(), "X001".into(), 42);
        assert_eq!(order.pay_total, 30.85);
        assert_eq!(order.status, OrderStatus::Received);
        assert_eq!(order.created_at, 42);
        assert_eq!(order.updated_at, 42);
    }

    #[test]
    fn test_new_order_malformed_numbers() {
        let input: NewOrder =
            serde_json::from_value(json!({"pay_rate": "abc", "pay_m2": "7,5", "pieces": "none"}))
                .unwrap();
        assert_eq!(input.pay_rate, 0.0);
        assert_eq!(input.pay_area, 7.5);
        assert!(input.pieces.is_empty());
    }

    #[test]
    fn test_edits_ignore_reserved_keys() {
        let mut order: Order = serde_json::from_value(legacy_record()).unwrap();
        let edits: OrderEdits = serde_json::from_value(json!({
            "notes": "stain on corner",
            "status": "received",
            "id": "ord_other",
            "updatedAt": 1,
            "deliveryAddress": "Rr. Nena Tereze"
        }))
        .unwrap();
        order.apply_edits(edits);
        assert_eq!(order.notes, "stain on corner");
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.id, "ord_abc");
        assert_eq!(order.updated_at, 1_700_000_100_000);
        assert!(!order.extra.contains_key("status"));
        assert_eq!(order.extra.get("deliveryAddress"), Some(&json!("Rr. Nena Tereze")));
    }
}
