//! Sales datasets derived from the order history.
//!
//! Neither of these is stored anywhere; both are recomputed from whatever
//! order list the reconciler produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Order, ProductSnapshot};

/// Maximum number of rows kept in the sales history view.
pub const SALES_HISTORY_LIMIT: usize = 50;

/// One sold line item, flattened out of its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    /// Synthetic id: `{order_id}_{product_id}`.
    pub id: String,
    pub product: ProductSnapshot,
    pub quantity: u32,
    pub price_at_purchase: f64,
    pub sold_at: DateTime<Utc>,
}

/// Best-selling product by total quantity sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub quantity: u32,
}

/// Aggregate figures for the dashboard stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesStats {
    pub total_revenue: f64,
    pub total_orders: usize,
    pub top_product: Option<TopProduct>,
}

/// Flatten orders into sales rows, newest first, truncated to
/// [`SALES_HISTORY_LIMIT`].
pub fn sales_from_orders(orders: &[Order]) -> Vec<SalesRow> {
    let mut rows: Vec<SalesRow> = orders
        .iter()
        .flat_map(|order| {
            order.items.iter().map(move |item| SalesRow {
                id: format!("{}_{}", order.id, item.product_id),
                product: item.product.clone(),
                quantity: item.quantity,
                price_at_purchase: item.price_at_purchase,
                sold_at: order.created_at,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
    rows.truncate(SALES_HISTORY_LIMIT);
    rows
}

/// Compute the aggregate stats from an order list.
pub fn stats_from_orders(orders: &[Order]) -> SalesStats {
    let total_revenue = orders.iter().map(|o| o.total_price).sum();
    let total_orders = orders.len();

    let mut by_product: Vec<TopProduct> = Vec::new();
    for order in orders {
        for item in &order.items {
            match by_product
                .iter_mut()
                .find(|p| p.name == item.product.name)
            {
                Some(entry) => entry.quantity += item.quantity,
                None => by_product.push(TopProduct {
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                }),
            }
        }
    }
    // Ties broken by name so the result is deterministic.
    by_product.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(a.name.cmp(&b.name)));

    SalesStats {
        total_revenue,
        total_orders,
        top_product: by_product.into_iter().next(),
    }
}

// ============================================================================
// Tests
// ============================================================================
