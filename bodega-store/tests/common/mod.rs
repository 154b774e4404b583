#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bodega_catalog::{Product, ProductRepository};
use bodega_core::audit::AuditSink;
use bodega_core::identity::{Identity, RoleTier};
use bodega_order::{
    CartManager, CheckoutEngine, DeliveryAddress, FulfillmentTracker, OrderHistory,
    OrderRepository,
};
use bodega_store::{AuditWriter, MemoryStore};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cart: CartManager,
    pub checkout: Arc<CheckoutEngine>,
    pub fulfillment: FulfillmentTracker,
    pub history: OrderHistory,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let products: Arc<dyn ProductRepository> = store.clone();
    let orders: Arc<dyn OrderRepository> = store.clone();
    let audit: Arc<dyn AuditSink> = Arc::new(AuditWriter::spawn(store.clone(), 64));

    Harness {
        store: store.clone(),
        cart: CartManager::new(products.clone(), orders.clone()),
        checkout: Arc::new(CheckoutEngine::new(
            products.clone(),
            orders.clone(),
            audit.clone(),
        )),
        fulfillment: FulfillmentTracker::new(products.clone(), orders.clone(), audit),
        history: OrderHistory::new(products, orders),
    }
}

pub fn shopper(username: &str) -> Identity {
    Identity::new(username, format!("{} (shopper)", username), RoleTier::Base)
}

pub fn admin() -> Identity {
    Identity::new("eleni", "Eleni P.", RoleTier::Elevated)
}

pub fn product(key: &str, price: u32, quantity: u32) -> Product {
    Product {
        key: key.to_string(),
        category: "pantry".to_string(),
        subcategory: "staples".to_string(),
        brand: "Horio".to_string(),
        price,
        quantity,
    }
}

pub fn address() -> DeliveryAddress {
    DeliveryAddress {
        key: "home".to_string(),
        city: "Athens".to_string(),
        area: "Pagkrati".to_string(),
        postal_code: "11633".to_string(),
        road: "Ymittou".to_string(),
        number: "89".to_string(),
        floor: "2".to_string(),
        buzzer: "K2".to_string(),
        specifications: Some("leave with the kiosk next door".to_string()),
    }
}

/// Wait for the audit writer task to drain the queue.
pub async fn wait_for_audit_entries(store: &MemoryStore, expected: usize) {
    for _ in 0..100 {
        if store.audit_entries().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
