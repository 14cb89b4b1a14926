//! Customer orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{Editable, Entity};
use super::id::{OrderId, ProductId};
use super::price::Price;
use super::status::OrderStatus;

/// Customer name given to stored orders that have none.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

fn unknown_customer() -> String {
    UNKNOWN_CUSTOMER.to_string()
}

/// An order for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip)]
    pub id: OrderId,
    #[serde(default)]
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default = "unknown_customer")]
    pub customer_name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub product_id: ProductId,
    pub quantity: i64,
    pub total_price: Price,
    pub status: OrderStatus,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
}

/// Partial order update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

impl OrderPatch {
    /// Patch that only changes the status.
    #[must_use]
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";
    const LABEL: &'static str = "order";
    const PLURAL: &'static str = "orders";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn set_id(&mut self, id: String) {
        self.id = OrderId::from(id);
    }
}

impl Editable for Order {
    type Draft = OrderDraft;
    type Patch = OrderPatch;
}
