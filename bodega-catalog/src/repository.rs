use async_trait::async_trait;

use bodega_core::CoreResult;

use crate::product::Product;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockReservation {
    /// The decrement was applied; `remaining` is the post-decrement count.
    Reserved { remaining: u32 },
    /// On-hand stock was below the requested amount; nothing changed.
    Insufficient { available: u32 },
    /// No product with that key exists; nothing changed.
    Missing,
}

/// Inventory Store access.
///
/// `reserve_stock` must perform the availability check and the subtraction
/// as one atomic step inside the store. Reading a quantity and writing a
/// computed one back from the caller is not an acceptable implementation.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(&self, key: &str) -> CoreResult<Option<Product>>;

    /// Fails with Conflict when a product with the same key already exists.
    async fn insert_product(&self, product: &Product) -> CoreResult<()>;

    /// Returns whether a record was removed.
    async fn delete_product(&self, key: &str) -> CoreResult<bool>;

    /// Atomically subtract `amount` if at least that much is on hand.
    async fn reserve_stock(&self, key: &str, amount: u32) -> CoreResult<StockReservation>;

    /// Atomically add `amount` back. Releasing against a product that was
    /// deleted in the meantime is a no-op.
    async fn release_stock(&self, key: &str, amount: u32) -> CoreResult<()>;
}
