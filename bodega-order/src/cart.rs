use std::sync::Arc;

use tracing::info;

use bodega_catalog::ProductRepository;
use bodega_core::identity::{Identity, RoleTier};
use bodega_core::{CoreError, CoreResult};

use crate::models::{LineItem, Order, ResolvedOrder};
use crate::repository::OrderRepository;
use crate::resolve::resolve_order;

/// Maintains the single open box per user: line-item edits, box deletion,
/// and the resolved open-box view. Stock is not checked here; that happens
/// once, at checkout.
pub struct CartManager {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl CartManager {
    pub fn new(products: Arc<dyn ProductRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { products, orders }
    }

    /// Open a box under `box_key`, or return it if the caller already has
    /// it open. A key taken by a closed or foreign order is a Conflict, as
    /// is a second open box under a different key.
    pub async fn create_or_get_open_order(
        &self,
        identity: &Identity,
        box_key: &str,
    ) -> CoreResult<Order> {
        identity.require(RoleTier::Base)?;
        if box_key.trim().is_empty() {
            return Err(CoreError::Validation("box key must not be empty".to_string()));
        }

        if let Some(existing) = self.orders.get_order(box_key).await? {
            if existing.username == identity.username && existing.is_open() {
                return Ok(existing);
            }
            return Err(CoreError::Conflict(format!(
                "box key {} is already taken",
                box_key
            )));
        }

        if let Some(open) = self.orders.find_open_order(&identity.username).await? {
            return Err(CoreError::Conflict(format!(
                "an open box already exists for {} under key {}",
                identity.username, open.box_key
            )));
        }

        let order = Order::new(box_key, &identity.username, &identity.display_name);
        self.orders.insert_order(&order).await?;
        info!("opened box {} for {}", box_key, identity.username);
        Ok(order)
    }

    /// Append a line item. Duplicate product keys are allowed; the final
    /// quantity set is settled at checkout.
    pub async fn add_line_item(
        &self,
        identity: &Identity,
        box_key: &str,
        product_key: &str,
        quantity: u32,
    ) -> CoreResult<Order> {
        identity.require(RoleTier::Base)?;
        if quantity == 0 {
            return Err(CoreError::Validation(format!(
                "quantity for product {} must be positive",
                product_key
            )));
        }

        let mut order = self.load_owned(identity, box_key).await?;
        if !order.is_open() {
            return Err(CoreError::Conflict(format!(
                "box {} is already checked out",
                box_key
            )));
        }
        if self.products.get_product(product_key).await?.is_none() {
            return Err(CoreError::NotFound(format!(
                "no product with key {}",
                product_key
            )));
        }

        order.line_items.push(LineItem::new(product_key, quantity));
        self.orders.update_order(&order).await?;
        info!("added {} x{} to box {}", product_key, quantity, box_key);
        Ok(order)
    }

    /// Remove the first line item whose product key matches.
    pub async fn remove_line_item(
        &self,
        identity: &Identity,
        box_key: &str,
        product_key: &str,
    ) -> CoreResult<Order> {
        identity.require(RoleTier::Base)?;

        let mut order = self.load_owned(identity, box_key).await?;
        if !order.is_open() {
            return Err(CoreError::Conflict(format!(
                "box {} is already checked out",
                box_key
            )));
        }

        let position = order
            .line_items
            .iter()
            .position(|item| item.product_key == product_key)
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "box {} has no line item for product {}",
                    box_key, product_key
                ))
            })?;
        order.line_items.remove(position);

        self.orders.update_order(&order).await?;
        info!("removed {} from box {}", product_key, box_key);
        Ok(order)
    }

    /// Delete a still-open box outright. Anything else, including a box
    /// owned by someone else, reads as absent.
    pub async fn delete_open_order(&self, identity: &Identity, box_key: &str) -> CoreResult<()> {
        identity.require(RoleTier::Base)?;

        match self.orders.get_order(box_key).await? {
            Some(order) if order.username == identity.username && order.is_open() => {
                self.orders.delete_order(box_key).await?;
                info!("deleted open box {} for {}", box_key, identity.username);
                Ok(())
            }
            _ => Err(CoreError::NotFound(format!(
                "no open box {} for {}",
                box_key, identity.username
            ))),
        }
    }

    /// The caller's open box with every line item resolved to full product
    /// attributes.
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

    async fn load_owned(&self, identity: &Identity, box_key: &str) -> CoreResult<Order> {
        self.orders
            .get_order(box_key)
            .await?
            .filter(|order| order.username == identity.username)
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "no box {} for {}",
                    box_key, identity.username
                ))
            })
    }
}
