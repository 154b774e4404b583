use std::sync::Arc;

use tracing::info;

use bodega_catalog::ProductRepository;
use bodega_core::audit::{ActionKind, AuditSink};
use bodega_core::identity::{Identity, RoleTier};
use bodega_core::CoreResult;

use crate::models::{OrderStatus, ResolvedOrder};
use crate::repository::OrderRepository;
use crate::resolve::{product_audit_entry, resolve_order};

/// Admin-facing view over orders awaiting delivery.
pub struct FulfillmentTracker {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    audit: Arc<dyn AuditSink>,
}

impl FulfillmentTracker {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            products,
            orders,
            audit,
        }
    }

    /// Every order in AWAITING_FULFILLMENT, oldest checkout first. A line
    /// item whose product has since been deleted resolves to the
    /// placeholder instead of failing the listing.
    pub async fn list_awaiting_fulfillment(
        &self,
        identity: &Identity,
    ) -> CoreResult<Vec<ResolvedOrder>> {
        identity.require(RoleTier::Elevated)?;

        let orders = self.orders.list_awaiting_fulfillment().await?;
        let mut resolved = Vec::with_capacity(orders.len());
        for order in orders {
            resolved.push(resolve_order(self.products.as_ref(), order).await);
        }
        Ok(resolved)
    }

    /// AWAITING_FULFILLMENT -> COMPLETE. Calling this for a box that is
    /// absent, still open, or already complete is an idempotent no-op; the
    /// transition only ever moves forward.
    pub async fn finish_delivery(&self, identity: &Identity, box_key: &str) -> CoreResult<()> {
        identity.require(RoleTier::Elevated)?;

        let Some(mut order) = self.orders.get_order(box_key).await? else {
            info!("finish_delivery for unknown box {}; nothing to do", box_key);
            return Ok(());
        };
        if order.status() != OrderStatus::AwaitingFulfillment {
            info!(
                "box {} is {:?}; finish_delivery is a no-op",
                box_key,
                order.status()
            );
            return Ok(());
        }

        order.complete_delivery();
        self.orders.update_order(&order).await?;

        for item in &order.line_items {
            let entry =
                product_audit_entry(self.products.as_ref(), identity, ActionKind::Deliver, item)
                    .await;
            self.audit.append(entry);
        }

        info!("box {} delivered by {}", box_key, identity.username);
        Ok(())
    }
}
