pub mod inventory;
pub mod product;
pub mod repository;

pub use inventory::{StockClaim, StockLedger};
pub use product::Product;
pub use repository::{ProductRepository, StockReservation};
