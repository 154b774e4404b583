use std::sync::Arc;

use tracing::{error, info};

use bodega_catalog::{ProductRepository, StockClaim, StockLedger};
use bodega_core::audit::{ActionKind, AuditSink};
use bodega_core::identity::{Identity, RoleTier};
use bodega_core::{CoreError, CoreResult};

use crate::models::{DeliveryAddress, LineItem, Order};
use crate::repository::OrderRepository;
use crate::resolve::product_audit_entry;

/// Converts an open box into a pending order in one atomic step: reserve
/// stock for every line item, freeze the address snapshot, and flip the
/// lifecycle flags. A checkout that fails for any reason leaves stock and
/// the order exactly as they were.
pub struct CheckoutEngine {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    audit: Arc<dyn AuditSink>,
}

impl CheckoutEngine {
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

    /// The submitted list is the authoritative final quantity set for the
    /// box, not a delta: matched lines take the submitted quantity, lines
    /// absent from it are dropped, and a submitted product the box never
    /// contained is NotFound.
    pub async fn checkout(
        &self,
        identity: &Identity,
        box_key: &str,
        submitted: &[LineItem],
        address: DeliveryAddress,
    ) -> CoreResult<Order> {
        identity.require(RoleTier::Base)?;
        address.validate()?;

        let order = self
            .orders
            .get_order(box_key)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no box with key {}", box_key)))?;
        if !order.is_open() {
            return Err(CoreError::Conflict(format!(
                "box {} is already checked out",
                box_key
            )));
        }

        let final_items = plan_line_items(&order, submitted)?;
        let claims: Vec<StockClaim> = final_items
            .iter()
            .map(|item| StockClaim {
                product_key: item.product_key.clone(),
                amount: item.quantity,
            })
            .collect();

        let ledger = StockLedger::new(self.products.as_ref());
        ledger.reserve_all(&claims).await?;

        let mut finalized = order;
        finalized.close_for_fulfillment(final_items, address);
        if let Err(err) = self.orders.update_order(&finalized).await {
            ledger.release_all(&claims).await;
            error!(
                "persisting checked-out box {} failed, reserved stock released: {}",
                box_key, err
            );
            return Err(err);
        }

        for item in &finalized.line_items {
            let entry =
                product_audit_entry(self.products.as_ref(), identity, ActionKind::Checkout, item)
                    .await;
            self.audit.append(entry);
        }

        info!(
            "box {} checked out by {} with {} line items",
            box_key,
            identity.username,
            finalized.line_items.len()
        );
        Ok(finalized)
    }
}

/// Merge the submitted list by product key and match it against the box.
fn plan_line_items(order: &Order, submitted: &[LineItem]) -> CoreResult<Vec<LineItem>> {
    if submitted.is_empty() {
        return Err(CoreError::Validation(
            "checkout requires at least one line item".to_string(),
        ));
    }

    let mut merged: Vec<LineItem> = Vec::new();
    for item in submitted {
        if item.quantity == 0 {
            return Err(CoreError::Validation(format!(
                "quantity for product {} must be positive",
                item.product_key
            )));
        }
        match merged.iter_mut().find(|m| m.product_key == item.product_key) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(item.clone()),
        }
    }

    for item in &merged {
        if !order
            .line_items
            .iter()
            .any(|line| line.product_key == item.product_key)
        {
            return Err(CoreError::NotFound(format!(
                "box {} has no line item for product {}",
                order.box_key, item.product_key
            )));
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_box(keys: &[&str]) -> Order {
        let mut order = Order::new("box-1", "nikos", "Nikos K.");
        for key in keys {
            order.line_items.push(LineItem::new(*key, 1));
        }
        order
    }

    #[test]
    fn submitted_quantities_replace_cart_quantities() {
        let order = open_box(&["feta-400g", "olive-oil-1l"]);
        let planned = plan_line_items(
            &order,
            &[LineItem::new("feta-400g", 3), LineItem::new("olive-oil-1l", 2)],
        )
        .unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].quantity, 3);
        assert_eq!(planned[1].quantity, 2);
    }

    #[test]
    fn duplicate_submitted_keys_are_merged() {
        let order = open_box(&["feta-400g"]);
        let planned = plan_line_items(
            &order,
            &[LineItem::new("feta-400g", 2), LineItem::new("feta-400g", 1)],
        )
        .unwrap();
        assert_eq!(planned, vec![LineItem::new("feta-400g", 3)]);
    }

    #[test]
    fn unsubmitted_cart_lines_are_dropped() {
        let order = open_box(&["feta-400g", "olive-oil-1l"]);
        let planned = plan_line_items(&order, &[LineItem::new("feta-400g", 1)]).unwrap();
        assert_eq!(planned, vec![LineItem::new("feta-400g", 1)]);
    }

    #[test]
    fn empty_submission_is_rejected() {
        let order = open_box(&["feta-400g"]);
        assert!(matches!(
            plan_line_items(&order, &[]),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let order = open_box(&["feta-400g"]);
        assert!(matches!(
            plan_line_items(&order, &[LineItem::new("feta-400g", 0)]),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn product_the_box_never_contained_is_not_found() {
        let order = open_box(&["feta-400g"]);
        assert!(matches!(
            plan_line_items(&order, &[LineItem::new("honey-500g", 1)]),
            Err(CoreError::NotFound(msg)) if msg.contains("honey-500g")
        ));
    }
}
