//! Order records with denormalized line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Delivered => "delivered",
        }
    }
}

/// Product details captured when the order was placed, so the order history
/// stays accurate after the product is edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One line of an order.
///
/// `price_at_purchase` is a snapshot taken at order creation and must never
/// be recomputed from the current product price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_purchase: f64,
    #[serde(rename = "products")]
    pub product: ProductSnapshot,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Payload for creating an order. The store assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

impl NewOrder {
    /// Attach a store-assigned id, producing the final record.
    pub fn into_order(self, id: String) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            delivery_address: self.delivery_address,
            status: self.status,
            total_price: self.total_price,
            created_at: self.created_at,
            items: self.items,
        }
    }
}

/// Checkout form data collected from the customer.
#[derive(Debug, Clone)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
    }

    #[test]
    fn line_item_uses_wire_name_for_snapshot() {
        let item = LineItem {
            product_id: ProductId::Int(1),
            quantity: 2,
            price_at_purchase: 150.0,
            product: ProductSnapshot {
                name: "Bread".to_string(),
                image_url: Some("/images/bread.jpg".to_string()),
            },
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["products"]["name"], "Bread");
    }
}
