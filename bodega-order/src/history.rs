use std::sync::Arc;

use bodega_catalog::ProductRepository;
use bodega_core::identity::{Identity, RoleTier};
use bodega_core::{CoreError, CoreResult};

use crate::models::ResolvedOrder;
use crate::repository::OrderRepository;
use crate::resolve::resolve_order;

/// Read-only retrieval of a user's orders, tolerant of products that have
/// been deleted since purchase.
pub struct OrderHistory {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderHistory {
    pub fn new(products: Arc<dyn ProductRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { products, orders }
    }

    /// The caller's open box, resolved.
    pub async fn get_open_order(&self, identity: &Identity) -> CoreResult<ResolvedOrder> {
        identity.require(RoleTier::Base)?;

        let order = self
            .orders
            .find_open_order(&identity.username)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!("no open box for {}", identity.username))
            })?;
        Ok(resolve_order(self.products.as_ref(), order).await)
    }

    /// One past (non-open) order of the caller's. A box that is still open
    /// or owned by someone else reads as absent.
    pub async fn get_past_order(
        &self,
        identity: &Identity,
        box_key: &str,
    ) -> CoreResult<ResolvedOrder> {
        identity.require(RoleTier::Base)?;

        let order = self
            .orders
            .get_order(box_key)
            .await?
            .filter(|order| order.username == identity.username && !order.user_pending)
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "no past box {} for {}",
                    box_key, identity.username
                ))
            })?;
        Ok(resolve_order(self.products.as_ref(), order).await)
    }

    /// All of the caller's non-open orders, newest checkout first.
    pub async fn list_past_orders(&self, identity: &Identity) -> CoreResult<Vec<ResolvedOrder>> {
        identity.require(RoleTier::Base)?;

        let orders = self.orders.list_closed_orders(&identity.username).await?;
        let mut resolved = Vec::with_capacity(orders.len());
        for order in orders {
            resolved.push(resolve_order(self.products.as_ref(), order).await);
        }
        Ok(resolved)
    }
}
