use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Domain Models
// ============================================================================

/// An order aggregate: one row in `orders` plus its `order_items` rows.
///
/// `id` is `None` until the repository assigns it on insert.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: Option<i64>,
    pub order_number: String,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub id: Option<i64>,
    pub sku_code: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl Order {
    /// Build an unsaved order with a freshly generated order number.
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self {
            id: None,
            order_number: generate_order_number(),
            items,
        }
    }

    pub fn sku_codes(&self) -> Vec<String> {
        self.items.iter().map(|i| i.sku_code.clone()).collect()
    }
}

/// Order numbers are `ORD-<uuid>`: unpredictable and practically unique,
/// so two concurrent requests never collide.
fn generate_order_number() -> String {
    format!("ORD-{}", Uuid::new_v4())
}

// ============================================================================
// Transport DTOs (camelCase on the wire)
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub item_requests: Vec<ItemRequest>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub sku_code: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<ItemRequest> for OrderItem {
    fn from(req: ItemRequest) -> Self {
        Self {
            id: None,
            sku_code: req.sku_code,
            price: req.price,
            quantity: req.quantity,
        }
    }
}

/// Stock status for a single SKU, as returned by the inventory service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStatus {
    pub sku_code: String,
    pub in_stock: bool,
}
