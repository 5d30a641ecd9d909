//! Document-database REST backend.
//!
//! Talks to a Firestore-style document store: each product and order is one
//! document whose fields are typed value envelopes (`stringValue`,
//! `integerValue`, `mapValue`, ...). Order line items are nested directly in
//! the order document as an array of maps, so an order is written
//! atomically. Images go to the companion storage bucket.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::FirestoreConfig;
use crate::models::{
    LineItem, NewOrder, NewProduct, Order, OrderStatus, Product, ProductId, ProductPatch,
    ProductSnapshot,
};

use super::error::check_response;
use super::{ProductStore, StoreError};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum documents fetched per collection read.
const PAGE_SIZE: u32 = 300;

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com/v1";
const STORAGE_HOST: &str = "https://firebasestorage.googleapis.com/v0";

pub struct FirestoreStore {
    client: Client,
    project_id: String,
    api_key: String,
    storage_bucket: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            storage_bucket: config.storage_bucket.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            FIRESTORE_HOST, self.project_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(self.collection_url(collection))
            .query(&[
                ("key", self.api_key.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;
        let response = check_response(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        // An empty collection comes back as an empty object.
        Ok(body
            .get("documents")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn patch_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut params: Vec<(String, String)> = vec![("key".to_string(), self.api_key.clone())];
        for field in fields.keys() {
            params.push(("updateMask.fieldPaths".to_string(), field.clone()));
        }

        let response = self
            .client
            .patch(self.document_url(collection, id))
            .query(&params)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for FirestoreStore {
    fn tag(&self) -> &'static str {
        "firestore"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let documents = self.list_documents("products").await?;
        let mut products = Vec::with_capacity(documents.len());
        for doc in &documents {
            match decode_product(doc) {
                Some(product) => products.push(product),
                None => warn!(document = %doc_id(doc).unwrap_or_default(),
                    "Skipping malformed product document"),
            }
        }
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let response = self
            .client
            .get(self.document_url("products", &id.to_string()))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        match check_response(response).await {
            Ok(response) => {
                let doc: Value = response
                    .json()
                    .await
                    .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
                Ok(decode_product(&doc))
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let response = self
            .client
            .post(self.collection_url("products"))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": encode_new_product(product) }))
            .send()
            .await?;
        let response = check_response(response).await?;
        let doc: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        decode_product(&doc)
            .ok_or_else(|| StoreError::InvalidResponse("unreadable created document".to_string()))
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<(), StoreError> {
        let fields = encode_patch(patch);
        if fields.is_empty() {
            return Ok(());
        }
        self.patch_fields("products", &id.to_string(), fields).await
    }

    async fn update_stock(&self, id: &ProductId, stock_quantity: u32) -> Result<(), StoreError> {
        self.update_product(id, &ProductPatch::stock(stock_quantity))
            .await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        self.delete_document("products", &id.to_string()).await
    }

    async fn delete_all_products(&self) -> Result<(), StoreError> {
        let documents = self.list_documents("products").await?;
        for doc in &documents {
            if let Some(id) = doc_id(doc) {
                self.delete_document("products", &id).await?;
            }
        }
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let documents = self.list_documents("orders").await?;
        let mut orders = Vec::with_capacity(documents.len());
        for doc in &documents {
            match decode_order(doc) {
                Some(order) => orders.push(order),
                None => warn!(document = %doc_id(doc).unwrap_or_default(),
                    "Skipping malformed order document"),
            }
        }
        Ok(orders)
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let response = self
            .client
            .post(self.collection_url("orders"))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": encode_new_order(order) }))
            .send()
            .await?;
        let response = check_response(response).await?;
        let doc: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        let id = doc_id(&doc)
            .ok_or_else(|| StoreError::InvalidResponse("created order has no id".to_string()))?;
        Ok(order.clone().into_order(id))
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let mut fields = Map::new();
        fields.insert("status".to_string(), str_value(status.as_str()));
        self.patch_fields("orders", id, fields).await
    }

    async fn upload_image(&self, filename: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let bucket = self
            .storage_bucket
            .as_ref()
            .ok_or_else(|| StoreError::Other("no storage bucket configured".to_string()))?;
        let object = format!("product-images/{}", filename);

        let response = self
            .client
            .post(format!("{}/b/{}/o", STORAGE_HOST, bucket))
            .query(&[
                ("uploadType", "media"),
                ("name", object.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;
        let response = check_response(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let token = body
            .get("downloadTokens")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(format!(
            "{}/b/{}/o/{}?alt=media&token={}",
            STORAGE_HOST,
            bucket,
            object.replace('/', "%2F"),
            token
        ))
    }
}

// ============================================================================
// Wire format: typed value envelopes
// ============================================================================

fn str_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn double_value(f: f64) -> Value {
    json!({ "doubleValue": f })
}

// Firestore represents 64-bit integers as strings.
fn int_value(i: i64) -> Value {
    json!({ "integerValue": i.to_string() })
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    json!({ "timestampValue": at.to_rfc3339() })
}

fn id_value(id: &ProductId) -> Value {
    match id {
        ProductId::Int(n) => int_value(*n),
        ProductId::Str(s) => str_value(s),
    }
}

fn decode_string(v: &Value) -> Option<String> {
    v.get("stringValue")?.as_str().map(str::to_string)
}

fn decode_f64(v: &Value) -> Option<f64> {
    if let Some(d) = v.get("doubleValue").and_then(Value::as_f64) {
        return Some(d);
    }
    v.get("integerValue")?.as_str()?.parse().ok()
}

fn decode_u32(v: &Value) -> Option<u32> {
    decode_f64(v).map(|f| f.max(0.0) as u32)
}

fn decode_id(v: &Value) -> Option<ProductId> {
    if let Some(s) = v.get("integerValue").and_then(Value::as_str) {
        return s.parse().ok().map(ProductId::Int);
    }
    decode_string(v).map(ProductId::Str)
}

/// Timestamps may arrive as `timestampValue` or as a plain ISO string,
/// depending on which client wrote the document.
fn decode_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let raw = v
        .get("timestampValue")
        .or_else(|| v.get("stringValue"))?
        .as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Trailing path segment of the document resource name.
fn doc_id(doc: &Value) -> Option<String> {
    doc.get("name")?
        .as_str()?
        .rsplit('/')
        .next()
        .map(str::to_string)
}

fn encode_new_product(product: &NewProduct) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), str_value(&product.name));
    if let Some(ref description) = product.description {
        fields.insert("description".to_string(), str_value(description));
    }
    fields.insert("price".to_string(), double_value(product.price));
    fields.insert(
        "stock_quantity".to_string(),
        int_value(product.stock_quantity as i64),
    );
    if let Some(ref image_url) = product.image_url {
        fields.insert("image_url".to_string(), str_value(image_url));
    }
    if let Some(ref category) = product.category {
        fields.insert("category".to_string(), str_value(category));
    }
    fields
}

fn encode_patch(patch: &ProductPatch) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(ref name) = patch.name {
        fields.insert("name".to_string(), str_value(name));
    }
    if let Some(ref description) = patch.description {
        fields.insert("description".to_string(), str_value(description));
    }
    if let Some(price) = patch.price {
        fields.insert("price".to_string(), double_value(price));
    }
    if let Some(stock_quantity) = patch.stock_quantity {
        fields.insert(
            "stock_quantity".to_string(),
            int_value(stock_quantity as i64),
        );
    }
    if let Some(ref image_url) = patch.image_url {
        fields.insert("image_url".to_string(), str_value(image_url));
    }
    if let Some(ref category) = patch.category {
        fields.insert("category".to_string(), str_value(category));
    }
    fields
}

fn encode_new_order(order: &NewOrder) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "customer_name".to_string(),
        str_value(&order.customer_name),
    );
    fields.insert(
        "customer_email".to_string(),
        str_value(&order.customer_email),
    );
    if let Some(ref phone) = order.customer_phone {
        fields.insert("customer_phone".to_string(), str_value(phone));
    }
    if let Some(ref address) = order.delivery_address {
        fields.insert("delivery_address".to_string(), str_value(address));
    }
    fields.insert("status".to_string(), str_value(order.status.as_str()));
    fields.insert("total_price".to_string(), double_value(order.total_price));
    fields.insert(
        "created_at".to_string(),
        timestamp_value(order.created_at),
    );

    let items: Vec<Value> = order.items.iter().map(encode_line_item).collect();
    fields.insert(
        "items".to_string(),
        json!({ "arrayValue": { "values": items } }),
    );
    fields
}

fn encode_line_item(item: &LineItem) -> Value {
    let mut snapshot = Map::new();
    snapshot.insert("name".to_string(), str_value(&item.product.name));
    if let Some(ref image_url) = item.product.image_url {
        snapshot.insert("image_url".to_string(), str_value(image_url));
    }

    let mut fields = Map::new();
    fields.insert("product_id".to_string(), id_value(&item.product_id));
    fields.insert("quantity".to_string(), int_value(item.quantity as i64));
    fields.insert(
        "price_at_purchase".to_string(),
        double_value(item.price_at_purchase),
    );
    fields.insert(
        "products".to_string(),
        json!({ "mapValue": { "fields": snapshot } }),
    );
    json!({ "mapValue": { "fields": fields } })
}

fn decode_product(doc: &Value) -> Option<Product> {
    let fields = doc.get("fields")?;
    Some(Product {
        id: ProductId::Str(doc_id(doc)?),
        name: fields.get("name").and_then(decode_string)?,
        description: fields.get("description").and_then(decode_string),
        price: fields.get("price").and_then(decode_f64)?,
        stock_quantity: fields.get("stock_quantity").and_then(decode_u32)?,
        image_url: fields.get("image_url").and_then(decode_string),
        category: fields.get("category").and_then(decode_string),
        provenance: Default::default(),
    })
}

fn decode_line_item(value: &Value) -> Option<LineItem> {
    let fields = value.get("mapValue")?.get("fields")?;
    let snapshot = fields
        .get("products")
        .and_then(|v| v.get("mapValue"))
        .and_then(|v| v.get("fields"));
    Some(LineItem {
        product_id: fields.get("product_id").and_then(decode_id)?,
        quantity: fields.get("quantity").and_then(decode_u32)?,
        price_at_purchase: fields.get("price_at_purchase").and_then(decode_f64)?,
        product: ProductSnapshot {
            name: snapshot
                .and_then(|s| s.get("name"))
                .and_then(decode_string)
                .unwrap_or_else(|| "Unknown".to_string()),
            image_url: snapshot.and_then(|s| s.get("image_url")).and_then(decode_string),
        },
    })
}

fn decode_order(doc: &Value) -> Option<Order> {
    let fields = doc.get("fields")?;
    let status = fields
        .get("status")
        .and_then(decode_string)
        .and_then(|s| serde_json::from_value(Value::String(s)).ok())?;

    let items = fields
        .get("items")
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(decode_line_item).collect())
        .unwrap_or_default();

    Some(Order {
        id: doc_id(doc)?,
        customer_name: fields.get("customer_name").and_then(decode_string)?,
        customer_email: fields.get("customer_email").and_then(decode_string)?,
        customer_phone: fields.get("customer_phone").and_then(decode_string),
        delivery_address: fields.get("delivery_address").and_then(decode_string),
        status,
        total_price: fields.get("total_price").and_then(decode_f64)?,
        created_at: fields.get("created_at").and_then(decode_timestamp)?,
        items,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product_doc() -> Value {
        json!({
            "name": "projects/demo/databases/(default)/documents/products/abc123",
            "fields": {
                "name": { "stringValue": "Bread" },
                "description": { "stringValue": "Artisan" },
                "price": { "doubleValue": 150.0 },
                "stock_quantity": { "integerValue": "20" },
                "image_url": { "stringValue": "/images/bread.jpg" }
            }
        })
    }

    #[test]
    fn decodes_a_product_document() {
        let product = decode_product(&product_doc()).unwrap();
        assert_eq!(product.id, ProductId::Str("abc123".to_string()));
        assert_eq!(product.name, "Bread");
        assert_eq!(product.price, 150.0);
        assert_eq!(product.stock_quantity, 20);
        assert!(product.category.is_none());
    }

    #[test]
    fn rejects_a_document_missing_required_fields() {
        let doc = json!({
            "name": "projects/demo/databases/(default)/documents/products/x",
            "fields": { "name": { "stringValue": "Nameless" } }
        });
        assert!(decode_product(&doc).is_none());
    }

    #[test]
    fn integer_price_still_decodes() {
        let mut doc = product_doc();
        doc["fields"]["price"] = json!({ "integerValue": "150" });
        let product = decode_product(&doc).unwrap();
        assert_eq!(product.price, 150.0);
    }

    #[test]
    fn order_document_round_trips_through_the_envelope_encoding() {
        let new_order = NewOrder {
            customer_name: "John Doe".to_string(),
            customer_email: "john@example.com".to_string(),
            customer_phone: None,
            delivery_address: Some("123 Main St".to_string()),
            status: OrderStatus::Pending,
            total_price: 324.0,
            created_at: Utc::now(),
            items: vec![LineItem {
                product_id: ProductId::Int(1),
                quantity: 2,
                price_at_purchase: 150.0,
                product: ProductSnapshot {
                    name: "Bread".to_string(),
                    image_url: None,
                },
            }],
        };

        let doc = json!({
            "name": "projects/demo/databases/(default)/documents/orders/ord1",
            "fields": encode_new_order(&new_order)
        });
        let decoded = decode_order(&doc).unwrap();
        assert_eq!(decoded.id, "ord1");
        assert_eq!(decoded.status, OrderStatus::Pending);
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].product.name, "Bread");
        assert_eq!(decoded.items[0].price_at_purchase, 150.0);
    }

    #[test]
    fn string_timestamps_from_older_clients_decode() {
        let v = json!({ "stringValue": "2026-08-01T10:00:00+00:00" });
        assert!(decode_timestamp(&v).is_some());
        let bad = json!({ "stringValue": "yesterday" });
        assert!(decode_timestamp(&bad).is_none());
    }
}
