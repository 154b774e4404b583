use async_trait::async_trait;

use bodega_core::CoreResult;

use crate::models::Order;

/// Order document access. One box key names one order; the open/closed
/// split is carried by the pending flags on the document itself.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get_order(&self, box_key: &str) -> CoreResult<Option<Order>>;

    /// Fails with Conflict when the box key is already taken.
    async fn insert_order(&self, order: &Order) -> CoreResult<()>;

    /// Fails with NotFound when no order with this key exists.
    async fn update_order(&self, order: &Order) -> CoreResult<()>;

    /// Returns whether a record was removed.
    async fn delete_order(&self, box_key: &str) -> CoreResult<bool>;

    /// The user's OPEN order, if any.
    async fn find_open_order(&self, username: &str) -> CoreResult<Option<Order>>;

    /// All orders awaiting delivery, oldest checkout first.
    async fn list_awaiting_fulfillment(&self) -> CoreResult<Vec<Order>>;

    /// The user's non-open orders, newest checkout first.
    async fn list_closed_orders(&self, username: &str) -> CoreResult<Vec<Order>>;
}
