use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use bodega_catalog::{Product, ProductRepository, StockReservation};
use bodega_core::audit::{AuditEntry, AuditStore};
use bodega_core::{CoreError, CoreResult};
use bodega_order::{Order, OrderRepository};

/// In-process store used by tests and embedded callers.
///
/// Each table sits behind its own lock and no lock is ever held across an
/// await point, so every operation is bounded. `reserve_stock` performs the
/// availability check and the subtraction under the write lock, which is
/// the atomicity boundary concurrent checkouts rely on.
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<String, Product>>,
    orders: RwLock<HashMap<String, Order>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the audit log, for assertions.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn read_products(&self) -> CoreResult<RwLockReadGuard<'_, HashMap<String, Product>>> {
        self.products
            .read()
            .map_err(|_| CoreError::Internal("product table lock poisoned".to_string()))
    }

    fn write_products(&self) -> CoreResult<RwLockWriteGuard<'_, HashMap<String, Product>>> {
        self.products
            .write()
            .map_err(|_| CoreError::Internal("product table lock poisoned".to_string()))
    }

    fn read_orders(&self) -> CoreResult<RwLockReadGuard<'_, HashMap<String, Order>>> {
        self.orders
            .read()
            .map_err(|_| CoreError::Internal("order table lock poisoned".to_string()))
    }

    fn write_orders(&self) -> CoreResult<RwLockWriteGuard<'_, HashMap<String, Order>>> {
        self.orders
            .write()
            .map_err(|_| CoreError::Internal("order table lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn get_product(&self, key: &str) -> CoreResult<Option<Product>> {
        Ok(self.read_products()?.get(key).cloned())
    }

    async fn insert_product(&self, product: &Product) -> CoreResult<()> {
        product.validate()?;
        let mut products = self.write_products()?;
        if products.contains_key(&product.key) {
            return Err(CoreError::Conflict(format!(
                "product {} already exists",
                product.key
            )));
        }
        products.insert(product.key.clone(), product.clone());
        Ok(())
    }

    async fn delete_product(&self, key: &str) -> CoreResult<bool> {
        Ok(self.write_products()?.remove(key).is_some())
    }

    async fn reserve_stock(&self, key: &str, amount: u32) -> CoreResult<StockReservation> {
        let mut products = self.write_products()?;
        match products.get_mut(key) {
            None => Ok(StockReservation::Missing),
            Some(product) if product.quantity < amount => Ok(StockReservation::Insufficient {
                available: product.quantity,
            }),
            Some(product) => {
                product.quantity -= amount;
                Ok(StockReservation::Reserved {
                    remaining: product.quantity,
                })
            }
        }
    }

    async fn release_stock(&self, key: &str, amount: u32) -> CoreResult<()> {
        if let Some(product) = self.write_products()?.get_mut(key) {
            product.quantity = product.quantity.saturating_add(amount);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn get_order(&self, box_key: &str) -> CoreResult<Option<Order>> {
        Ok(self.read_orders()?.get(box_key).cloned())
    }

    async fn insert_order(&self, order: &Order) -> CoreResult<()> {
        let mut orders = self.write_orders()?;
        if orders.contains_key(&order.box_key) {
            return Err(CoreError::Conflict(format!(
                "box key {} is already taken",
                order.box_key
            )));
        }
        orders.insert(order.box_key.clone(), order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> CoreResult<()> {
        let mut orders = self.write_orders()?;
        if !orders.contains_key(&order.box_key) {
            return Err(CoreError::NotFound(format!(
                "no box with key {}",
                order.box_key
            )));
        }
        orders.insert(order.box_key.clone(), order.clone());
        Ok(())
    }

    async fn delete_order(&self, box_key: &str) -> CoreResult<bool> {
        Ok(self.write_orders()?.remove(box_key).is_some())
    }

    async fn find_open_order(&self, username: &str) -> CoreResult<Option<Order>> {
        Ok(self
            .read_orders()?
            .values()
            .find(|order| order.username == username && order.user_pending)
            .cloned())
    }

    async fn list_awaiting_fulfillment(&self) -> CoreResult<Vec<Order>> {
        let mut awaiting: Vec<Order> = self
            .read_orders()?
            .values()
            .filter(|order| order.admin_pending && !order.user_pending)
            .cloned()
            .collect();
        awaiting.sort_by_key(|order| order.checked_out_at);
        Ok(awaiting)
    }

    async fn list_closed_orders(&self, username: &str) -> CoreResult<Vec<Order>> {
        let mut closed: Vec<Order> = self
            .read_orders()?
            .values()
            .filter(|order| order.username == username && !order.user_pending)
            .cloned()
            .collect();
        closed.sort_by_key(|order| std::cmp::Reverse(order.checked_out_at));
        Ok(closed)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn persist_entry(&self, entry: &AuditEntry) -> CoreResult<()> {
        self.audit
            .write()
            .map_err(|_| CoreError::Internal("audit table lock poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}
