//! Versioned on-disk document for the order collection
//!
//! # Schema versions
//!
//! | Version | Shape |
//! |---------|-------|
//! | 1 | bare JSON array of order objects (legacy device data) |
//! | 2 | `{"schema_version": 2, "orders": [...]}` |
//!
//! Decoding never fails. Unreadable content decodes to an empty collection with
//! [`DocState::Corrupt`]. Individual records are repaired where possible; a
//! record that still cannot be typed is kept as raw JSON in
//! [`Decoded::rejected`] and moved to quarantine when the document is next
//! rewritten. Every repair is counted so the migration pass knows the document
//! must be rewritten.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::order::lenient;
use shared::util::new_order_id;
use shared::{Order, OrderStatus};

/// Current schema version written by [`encode`]
pub const SCHEMA_VERSION: u32 = 2;

/// State of the stored document before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    /// Nothing stored yet
    Missing,
    /// Stored bytes were not a recognizable document
    Corrupt,
    /// Readable document of the given schema version
    Valid(u32),
}

/// Result of decoding a stored document
#[derive(Debug, Clone)]
pub struct Decoded {
    pub orders: Vec<Order>,
    pub state: DocState,
    /// Records whose shape was repaired (status case, legacy keys, missing id)
    pub repaired: usize,
    /// Raw records that could not be typed, kept verbatim for quarantine
    pub rejected: Vec<Value>,
}

impl Decoded {
    fn empty(state: DocState) -> Self {
        Self {
            orders: Vec::new(),
            state,
            repaired: 0,
            rejected: Vec::new(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        self.state == DocState::Corrupt
    }

    /// The document should be rewritten in the current schema.
    pub fn needs_rewrite(&self) -> bool {
        match self.state {
            DocState::Missing => false,
            DocState::Corrupt => true,
            DocState::Valid(version) => {
                version < SCHEMA_VERSION || self.repaired > 0 || !self.rejected.is_empty()
            }
        }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    schema_version: u32,
    orders: &'a [Order],
}

/// Serialize the collection in the current schema.
pub fn encode(orders: &[Order]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&Document {
        schema_version: SCHEMA_VERSION,
        orders,
    })
}

/// Decode stored bytes. `None` means the slot is empty.
pub fn decode(raw: Option<&[u8]>) -> Decoded {
    let Some(bytes) = raw else {
        return Decoded::empty(DocState::Missing);
    };

    let document: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, len = bytes.len(), "Stored orders are not valid JSON, treating as empty");
            return Decoded::empty(DocState::Corrupt);
        }
    };

    let (version, records) = match document {
        Value::Array(records) => (1, records),
        Value::Object(mut map) => match map.remove("orders") {
            Some(Value::Array(records)) => {
                let version = map
                    .get("schema_version")
                    .map(lenient::coerce_i64)
                    .unwrap_or(1)
                    .clamp(1, i64::from(u32::MAX)) as u32;
                (version, records)
            }
            _ => {
                tracing::warn!("Stored orders document has no orders array, treating as empty");
                return Decoded::empty(DocState::Corrupt);
            }
        },
        _ => {
            tracing::warn!("Stored orders document is not a collection, treating as empty");
            return Decoded::empty(DocState::Corrupt);
        }
    };

    let mut decoded = Decoded::empty(DocState::Valid(version));
    for (index, mut record) in records.into_iter().enumerate() {
        let Some(repaired) = repair_record(&mut record) else {
            tracing::warn!(index, "Stored order is not an object, setting it aside");
            decoded.rejected.push(record);
            continue;
        };
        match Order::deserialize(&record) {
            Ok(order) => {
                if repaired {
                    decoded.repaired += 1;
                }
                decoded.orders.push(order);
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "Stored order has an unusable shape, setting it aside");
                decoded.rejected.push(record);
            }
        }
    }
    decoded
}

/// Repair a raw record in place. Returns `Some(true)` when anything changed,
/// `None` when the record is not an object at all.
fn repair_record(record: &mut Value) -> Option<bool> {
    let map = record.as_object_mut()?;
    let mut repaired = false;

    // id: must be a non-empty string
    let id = map.get("id").map(lenient::coerce_string).unwrap_or_default();
    if id.trim().is_empty() {
        let fresh = new_order_id();
        tracing::warn!(order_id = %fresh, "Stored order had no id, assigned a new one");
        map.insert("id".into(), Value::String(fresh));
        repaired = true;
    } else if !matches!(map.get("id"), Some(Value::String(_))) {
        map.insert("id".into(), Value::String(id));
        repaired = true;
    }

    // status: canonical lower-case name
    let canonical = match map.get("status") {
        Some(Value::String(raw)) => match raw.parse::<OrderStatus>() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "Unknown stored status, resetting to received");
                OrderStatus::Received
            }
        },
        _ => OrderStatus::Received,
    };
    if map.get("status").and_then(Value::as_str) != Some(canonical.as_str()) {
        map.insert("status".into(), Value::String(canonical.as_str().into()));
        repaired = true;
    }

    // createdAt -> ts
    if let Some(created) = map.remove("createdAt") {
        if !map.contains_key("ts") {
            map.insert("ts".into(), created);
        }
        repaired = true;
    }

    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_missing_slot() {
        let decoded = decode(None);
        assert_eq!(decoded.state, DocState::Missing);
        assert!(decoded.orders.is_empty());
        assert!(!decoded.needs_rewrite());
    }

    #[test]
    fn test_corrupt_content_is_empty() {
        for raw in [&b"{not json"[..], b"42", b"\"orders\"", b"{\"orders\": 3}"] {
            let decoded = decode(Some(raw));
            assert_eq!(decoded.state, DocState::Corrupt);
            assert!(decoded.orders.is_empty());
        }
    }

    #[test]
    fn test_legacy_array_is_v1() {
        let raw = bytes(json!([{"id": "ord_1", "status": "pranim", "code": "X001"}]));
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.state, DocState::Valid(1));
        assert_eq!(decoded.orders[0].status, OrderStatus::Received);
        assert!(decoded.needs_rewrite());
    }

    #[test]
    fn test_current_document_needs_no_rewrite() {
        let order: Order = serde_json::from_value(json!({"id": "ord_1", "status": "ready", "updatedAt": 5})).unwrap();
        let raw = encode(&[order.clone()]).unwrap();
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.state, DocState::Valid(SCHEMA_VERSION));
        assert_eq!(decoded.repaired, 0);
        assert!(!decoded.needs_rewrite());
        assert_eq!(decoded.orders, vec![order]);
    }

    #[test]
    fn test_status_case_repaired() {
        let raw = bytes(json!({"schema_version": 2, "orders": [{"id": "ord_1", "status": "GATI"}]}));
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.orders[0].status, OrderStatus::Ready);
        assert_eq!(decoded.repaired, 1);
        assert!(decoded.needs_rewrite());
    }

    #[test]
    fn test_unknown_status_resets_to_received() {
        let raw = bytes(json!([{"id": "ord_1", "status": "lost"}]));
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.orders[0].status, OrderStatus::Received);
        assert_eq!(decoded.repaired, 1);
    }

    #[test]
    fn test_missing_id_assigned() {
        let raw = bytes(json!([{"status": "received", "code": "X004"}, {"id": 17, "status": "received"}]));
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.orders.len(), 2);
        assert!(decoded.orders[0].id.starts_with("ord_"));
        assert_eq!(decoded.orders[1].id, "17");
        assert_eq!(decoded.repaired, 2);
    }

    #[test]
    fn test_created_at_alias() {
        let raw = bytes(json!([{"id": "ord_1", "status": "received", "createdAt": 99}]));
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.orders[0].created_at, 99);
    }

    #[test]
    fn test_malformed_flags_record_kept() {
        let raw = bytes(json!([
            {"id": "ord_keep", "status": "cleaning", "client_name": "Agim", "flags": null},
            {"id": "ord_1", "status": "received", "flags": "broken"},
            {"id": "ord_2", "status": "received"}
        ]));
        let decoded = decode(Some(&raw));
        assert!(decoded.rejected.is_empty());
        let ids: Vec<&str> = decoded.orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["ord_keep", "ord_1", "ord_2"]);
        assert_eq!(decoded.orders[0].status, OrderStatus::Cleaning);
    }

    #[test]
    fn test_non_object_records_set_aside_verbatim() {
        let raw = bytes(json!(["not an order", 42, {"id": "ord_2", "status": "received"}]));
        let decoded = decode(Some(&raw));
        assert_eq!(decoded.rejected, vec![json!("not an order"), json!(42)]);
        assert_eq!(decoded.orders.len(), 1);
        assert!(decoded.needs_rewrite());
    }
}
