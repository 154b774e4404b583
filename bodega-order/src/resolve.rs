use tracing::warn;

use bodega_catalog::ProductRepository;
use bodega_core::audit::{ActionKind, AuditEntry};
use bodega_core::identity::Identity;

use crate::models::{LineItem, Order, ResolvedLineItem, ResolvedOrder};

/// Resolve every line item against the live catalog. A product that is
/// missing or whose lookup fails degrades to the `None` placeholder; a
/// single bad product never fails the whole view.
pub(crate) async fn resolve_order(products: &dyn ProductRepository, order: Order) -> ResolvedOrder {
    let mut line_items = Vec::with_capacity(order.line_items.len());
    for item in &order.line_items {
        let product = match products.get_product(&item.product_key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    "product lookup for {} failed while resolving box {}: {}",
                    item.product_key, order.box_key, err
                );
                None
            }
        };
        line_items.push(ResolvedLineItem {
            product_key: item.product_key.clone(),
            quantity: item.quantity,
            product,
        });
    }

    ResolvedOrder {
        status: order.status(),
        box_key: order.box_key,
        username: order.username,
        display_name: order.display_name,
        created_at: order.created_at,
        checked_out_at: order.checked_out_at,
        line_items,
        delivery_address: order.delivery_address,
    }
}

/// Build the audit entry for one line item, with product attributes filled
/// in best-effort from the catalog.
pub(crate) async fn product_audit_entry(
    products: &dyn ProductRepository,
    identity: &Identity,
    action: ActionKind,
    item: &LineItem,
) -> AuditEntry {
    let mut entry = AuditEntry::record(identity, action, item.product_key.clone());
    entry.amount = Some(item.quantity);
    match products.get_product(&item.product_key).await {
        Ok(Some(product)) => {
            entry.category = Some(product.category);
            entry.subcategory = Some(product.subcategory);
            entry.brand = Some(product.brand);
            entry.price = Some(product.price);
        }
        Ok(None) => {}
        Err(err) => {
            warn!("audit lookup for product {} failed: {}", item.product_key, err);
        }
    }
    entry
}
