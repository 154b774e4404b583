use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_catalog::Product;
use bodega_core::{CoreError, CoreResult};

/// Lifecycle derived from the `(user_pending, admin_pending)` flag pair.
/// Transitions only ever move forward; there is no cancellation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    AwaitingFulfillment,
    Complete,
}

/// One product's slot in a box. Embedded; it lives and dies with the order
/// that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_key: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_key: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_key: product_key.into(),
            quantity,
        }
    }
}

/// Address snapshot frozen into the order at checkout. Later edits to the
/// user's address book never touch past or pending orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub key: String,
    pub city: String,
    pub area: String,
    pub postal_code: String,
    pub road: String,
    pub number: String,
    pub floor: String,
    pub buzzer: String,
    pub specifications: Option<String>,
}

impl DeliveryAddress {
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("key", &self.key),
            ("city", &self.city),
            ("area", &self.area),
            ("postal_code", &self.postal_code),
            ("road", &self.road),
            ("number", &self.number),
            ("floor", &self.floor),
            ("buzzer", &self.buzzer),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "delivery address {} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// A purchase box.
///
/// The flag pair jointly encodes the lifecycle: `(true, false)` is OPEN,
/// `(false, true)` is AWAITING_FULFILLMENT, `(false, false)` is COMPLETE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub box_key: String,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub line_items: Vec<LineItem>,
    pub delivery_address: Option<DeliveryAddress>,
    pub user_pending: bool,
    pub admin_pending: bool,
}

impl Order {
    /// A fresh open box with no line items and no address.
    pub fn new(
        box_key: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            box_key: box_key.into(),
            username: username.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
            checked_out_at: None,
            line_items: Vec::new(),
            delivery_address: None,
            user_pending: true,
            admin_pending: false,
        }
    }

    pub fn status(&self) -> OrderStatus {
        match (self.user_pending, self.admin_pending) {
            (true, _) => OrderStatus::Open,
            (false, true) => OrderStatus::AwaitingFulfillment,
            (false, false) => OrderStatus::Complete,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == OrderStatus::Open
    }

    /// OPEN -> AWAITING_FULFILLMENT: freeze the final line items and the
    /// address snapshot and stamp the checkout instant, in one step.
    pub(crate) fn close_for_fulfillment(&mut self, line_items: Vec<LineItem>, address: DeliveryAddress) {
        self.line_items = line_items;
        self.delivery_address = Some(address);
        self.checked_out_at = Some(Utc::now());
        self.user_pending = false;
        self.admin_pending = true;
    }

    /// AWAITING_FULFILLMENT -> COMPLETE.
    pub(crate) fn complete_delivery(&mut self) {
        self.admin_pending = false;
    }
}

/// Line item with its product resolved against the live catalog.
/// `product: None` is the deleted-product placeholder; consumers branch on
/// presence, never on a sentinel value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLineItem {
    pub product_key: String,
    pub quantity: u32,
    pub product: Option<Product>,
}

/// An order shaped for read surfaces, with products resolved and the
/// lifecycle state made explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedOrder {
    pub box_key: String,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub line_items: Vec<ResolvedLineItem>,
    pub delivery_address: Option<DeliveryAddress>,
}
