//! Compiled-in sample data.
//!
//! The ultimate fallback tier: used when neither the remote store nor the
//! local persisted store yields records. Always returned as fresh copies so
//! callers can tag and reorder without touching a shared dataset.

use chrono::{Duration, Utc};

use crate::models::{
    LineItem, Order, OrderStatus, Product, ProductId, ProductSnapshot, Provenance,
};

/// The default product catalog (4 items).
pub fn default_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::Int(1),
            name: "Bread".to_string(),
            description: Some(
                "Freshly baked artisan bread with a soft interior and crispy crust.".to_string(),
            ),
            price: 150.00,
            stock_quantity: 20,
            image_url: Some("/images/bread.jpg".to_string()),
            category: Some("Bread".to_string()),
            provenance: Provenance::Remote,
        },
        Product {
            id: ProductId::Int(2),
            name: "Bun".to_string(),
            description: Some("Soft and fluffy tea bun, perfect for a quick snack.".to_string()),
            price: 50.00,
            stock_quantity: 50,
            image_url: Some("/images/bun.jpg".to_string()),
            category: Some("Buns".to_string()),
            provenance: Provenance::Remote,
        },
        Product {
            id: ProductId::Int(3),
            name: "Fish Bun".to_string(),
            description: Some(
                "Traditional triangular bun filled with spicy fish and potato mix.".to_string(),
            ),
            price: 60.00,
            stock_quantity: 30,
            image_url: Some("/images/fish_bun.jpg".to_string()),
            category: Some("Savory".to_string()),
            provenance: Provenance::Remote,
        },
        Product {
            id: ProductId::Int(4),
            name: "Viyan Roll".to_string(),
            description: Some(
                "Crispy breaded roll filled with seasoned vegetables and mackerel.".to_string(),
            ),
            price: 40.00,
            stock_quantity: 40,
            image_url: Some("/images/viyan_roll.jpg".to_string()),
            category: Some("Short Eats".to_string()),
            provenance: Provenance::Remote,
        },
    ]
}

/// The default order history (2 items).
pub fn default_orders() -> Vec<Order> {
    vec![
        Order {
            id: "ord_12345678".to_string(),
            customer_name: "John Doe".to_string(),
            customer_email: "john@example.com".to_string(),
            customer_phone: Some("+1234567890".to_string()),
            delivery_address: Some("123 Main St, City".to_string()),
            status: OrderStatus::Pending,
            total_price: 45.50,
            created_at: Utc::now(),
            items: vec![LineItem {
                product_id: ProductId::Int(1),
                quantity: 2,
                price_at_purchase: 150.00,
                product: ProductSnapshot {
                    name: "Bread".to_string(),
                    image_url: Some("/images/bread.jpg".to_string()),
                },
            }],
        },
        Order {
            id: "ord_87654321".to_string(),
            customer_name: "Jane Smith".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: Some("+0987654321".to_string()),
            delivery_address: Some("456 Oak Ave, Town".to_string()),
            status: OrderStatus::Completed,
            total_price: 25.00,
            created_at: Utc::now() - Duration::days(1),
            items: vec![LineItem {
                product_id: ProductId::Int(2),
                quantity: 1,
                price_at_purchase: 50.00,
                product: ProductSnapshot {
                    name: "Bun".to_string(),
                    image_url: Some("/images/bun.jpg".to_string()),
                },
            }],
        },
    ]
}
