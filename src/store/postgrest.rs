//! Relational REST backend.
//!
//! Talks to a Supabase-style PostgREST endpoint: `products` and `orders`
//! tables plus an `order_items` table embedded into order reads. Line items
//! carry denormalized product name and image columns so the order history
//! survives product edits and deletions.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::SupabaseConfig;
use crate::models::{
    LineItem, NewOrder, NewProduct, Order, OrderStatus, Product, ProductId, ProductPatch,
    ProductSnapshot,
};

use super::error::check_response;
use super::{ProductStore, StoreError};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct PostgrestStore {
    client: Client,
    base_url: String,
}

impl PostgrestStore {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.anon_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.anon_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

// ============================================================================
// Wire rows
// ============================================================================

/// `order_items` row with its denormalized product snapshot columns.
#[derive(Debug, Serialize, Deserialize)]
struct ItemRow {
    product_id: ProductId,
    quantity: u32,
    price_at_purchase: f64,
    product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<String>,
}

impl ItemRow {
    fn from_item(item: &LineItem, order_id: &str) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            product_name: item.product.name.clone(),
            product_image_url: item.product.image_url.clone(),
            order_id: Some(order_id.to_string()),
        }
    }

    fn into_item(self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            quantity: self.quantity,
            price_at_purchase: self.price_at_purchase,
            product: ProductSnapshot {
                name: self.product_name,
                image_url: self.product_image_url,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: String,
    customer_name: String,
    customer_email: String,
    #[serde(default)]
    customer_phone: Option<String>,
    #[serde(default)]
    delivery_address: Option<String>,
    status: OrderStatus,
    total_price: f64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    items: Vec<ItemRow>,
}

impl OrderRow {
    fn into_order(self) -> Order {
        Order {
            id: self.id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            delivery_address: self.delivery_address,
            status: self.status,
            total_price: self.total_price,
            created_at: self.created_at,
            items: self.items.into_iter().map(ItemRow::into_item).collect(),
        }
    }
}

#[async_trait]
impl ProductStore for PostgrestStore {
    fn tag(&self) -> &'static str {
        "postgrest"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let response = self
            .client
            .get(self.table_url("products"))
            .query(&[("select", "*")])
            .send()
            .await?;
        let response = check_response(response).await?;
        let products: Vec<Product> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let filter = format!("eq.{}", id);
        let response = self
            .client
            .get(self.table_url("products"))
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await?;
        let response = check_response(response).await?;
        let mut products: Vec<Product> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(if products.is_empty() {
            None
        } else {
            Some(products.remove(0))
        })
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let response = self
            .client
            .post(self.table_url("products"))
            .header("Prefer", "return=representation")
            .json(product)
            .send()
            .await?;
        let response = check_response(response).await?;
        let mut created: Vec<Product> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if created.is_empty() {
            return Err(StoreError::InvalidResponse(
                "insert returned no representation".to_string(),
            ));
        }
        Ok(created.remove(0))
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.table_url("products"))
            .query(&[("id", &format!("eq.{}", id))])
            .json(patch)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn update_stock(&self, id: &ProductId, stock_quantity: u32) -> Result<(), StoreError> {
        self.update_product(id, &ProductPatch::stock(stock_quantity))
            .await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.table_url("products"))
            .query(&[("id", &format!("eq.{}", id))])
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn delete_all_products(&self) -> Result<(), StoreError> {
        // Matches every row; PostgREST refuses an unfiltered delete.
        let response = self
            .client
            .delete(self.table_url("products"))
            .query(&[("id", "gt.0")])
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let response = self
            .client
            .get(self.table_url("orders"))
            .query(&[
                ("select", "*,items:order_items(*)"),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        let response = check_response(response).await?;
        let rows: Vec<OrderRow> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(rows.into_iter().map(OrderRow::into_order).collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let response = self
            .client
            .post(self.table_url("orders"))
            .header("Prefer", "return=representation")
            .json(&json!({
                "customer_name": order.customer_name,
                "customer_email": order.customer_email,
                "customer_phone": order.customer_phone,
                "delivery_address": order.delivery_address,
                "status": order.status,
                "total_price": order.total_price,
                "created_at": order.created_at,
            }))
            .send()
            .await?;
        let response = check_response(response).await?;
        let mut rows: Vec<OrderRow> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if rows.is_empty() {
            return Err(StoreError::InvalidResponse(
                "insert returned no representation".to_string(),
            ));
        }
        let id = rows.remove(0).id;

        // The order row exists at this point; losing its line items is
        // logged but does not fail the placement.
        let item_rows: Vec<ItemRow> = order
            .items
            .iter()
            .map(|item| ItemRow::from_item(item, &id))
            .collect();
        let items_result = async {
            let response = self
                .client
                .post(self.table_url("order_items"))
                .json(&item_rows)
                .send()
                .await?;
            check_response(response).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        if let Err(e) = items_result {
            warn!(order_id = %id, error = %e, "Failed to insert order line items");
        }

        Ok(order.clone().into_order(id))
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.table_url("orders"))
            .query(&[("id", &format!("eq.{}", id))])
            .json(&json!({ "status": status }))
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn upload_image(&self, filename: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let response = self
            .client
            .post(format!(
                "{}/storage/v1/object/product-images/{}",
                self.base_url, filename
            ))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;
        check_response(response).await?;
        Ok(format!(
            "{}/storage/v1/object/public/product-images/{}",
            self.base_url, filename
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_row_embeds_items() {
        let json = r#"{
            "id": "ord_1",
            "customer_name": "John Doe",
            "customer_email": "john@example.com",
            "status": "pending",
            "total_price": 45.5,
            "created_at": "2026-08-01T10:00:00Z",
            "items": [{
                "product_id": 1,
                "quantity": 2,
                "price_at_purchase": 150.0,
                "product_name": "Bread",
                "product_image_url": "/images/bread.jpg"
            }]
        }"#;
        let row: OrderRow = serde_json::from_str(json).unwrap();
        let order = row.into_order();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product.name, "Bread");
        assert_eq!(order.items[0].product_id, ProductId::Int(1));
        assert!(order.customer_phone.is_none());
    }

    #[test]
    fn item_row_snapshot_survives_the_round_trip() {
        let item = LineItem {
            product_id: ProductId::Int(3),
            quantity: 1,
            price_at_purchase: 60.0,
            product: ProductSnapshot {
                name: "Fish Bun".to_string(),
                image_url: None,
            },
        };
        let row = ItemRow::from_item(&item, "ord_9");
        assert_eq!(row.order_id.as_deref(), Some("ord_9"));
        assert_eq!(row.into_item(), item);
    }
}
