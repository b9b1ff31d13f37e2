use super::*;
use serde_json::json;

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(storage, StoreConfig::default())
}

fn create_test_manager_with_limit(max_active_per_client: usize) -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    let config = StoreConfig {
        max_active_per_client,
        ..StoreConfig::default()
    };
    OrdersManager::with_storage(storage, config)
}

fn new_order(name: &str, phone: &str) -> NewOrder {
    NewOrder {
        client_name: name.to_string(),
        client_phone: phone.to_string(),
        pay_rate: 2.5,
        pay_area: 10.0,
        ..Default::default()
    }
}

// ========================================================================
// Helper: build a raw order as another writer would send it
// ========================================================================

fn raw_order(id: &str, status: &str, updated_at: i64) -> Order {
    serde_json::from_value(json!({
        "id": id,
        "code": "X001",
        "status": status,
        "ts": 1,
        "updatedAt": updated_at,
        "client_name": "Agim Berisha",
        "client_phone": "044123456",
    }))
    .unwrap()
}
