use tracing::error;

use bodega_core::{CoreError, CoreResult};

use crate::repository::{ProductRepository, StockReservation};

/// One product's share of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockClaim {
    pub product_key: String,
    pub amount: u32,
}

/// Applies a set of stock claims all-or-nothing.
///
/// Claims are reserved in order; the first failure releases every claim
/// already applied before the error is returned, so a failed run leaves
/// stock exactly as it found it.
pub struct StockLedger<'a> {
    products: &'a dyn ProductRepository,
}

impl<'a> StockLedger<'a> {
    pub fn new(products: &'a dyn ProductRepository) -> Self {
        Self { products }
    }

    pub async fn reserve_all(&self, claims: &[StockClaim]) -> CoreResult<()> {
        for (applied, claim) in claims.iter().enumerate() {
            let outcome = match self.products.reserve_stock(&claim.product_key, claim.amount).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.release_all(&claims[..applied]).await;
                    return Err(err);
                }
            };
            match outcome {
                StockReservation::Reserved { .. } => {}
                StockReservation::Insufficient { available } => {
                    self.release_all(&claims[..applied]).await;
                    return Err(CoreError::Conflict(format!(
                        "not enough stock for product {}: requested {}, available {}",
                        claim.product_key, claim.amount, available
                    )));
                }
                StockReservation::Missing => {
                    self.release_all(&claims[..applied]).await;
                    return Err(CoreError::NotFound(format!(
                        "product {} no longer exists",
                        claim.product_key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Compensate an already-reserved claim set, e.g. when persisting the
    /// order fails after reservation succeeded. Release failures are logged
    /// and skipped; the remaining claims are still released.
    pub async fn release_all(&self, claims: &[StockClaim]) {
        for claim in claims.iter().rev() {
            if let Err(err) = self.products.release_stock(&claim.product_key, claim.amount).await {
                error!(
                    "failed to restore {} units of {}: {}",
                    claim.amount, claim.product_key, err
                );
            }
        }
    }
}
