pub mod cart;
pub mod checkout;
pub mod fulfillment;
pub mod history;
pub mod models;
pub mod repository;
mod resolve;

pub use cart::CartManager;
pub use checkout::CheckoutEngine;
pub use fulfillment::FulfillmentTracker;
pub use history::OrderHistory;
pub use models::{DeliveryAddress, LineItem, Order, OrderStatus, ResolvedLineItem, ResolvedOrder};
pub use repository::OrderRepository;
