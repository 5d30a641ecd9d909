//! In-memory store used when no remote backend is configured.
//!
//! Seeded once at startup from the local persisted store (or the compiled-in
//! defaults) and mutated in memory from then on. Write-through to disk is
//! the admin service's job, not this store's.

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;

use crate::models::{NewOrder, NewProduct, Order, OrderStatus, Product, ProductId, ProductPatch};

use super::{data_url, ProductStore, StoreError};

pub struct LocalOnlyStore {
    products: Mutex<Vec<Product>>,
    orders: Mutex<Vec<Order>>,
}

impl LocalOnlyStore {
    pub fn new(seed: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(seed),
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Random integer id for locally created products. The range keeps them
    /// clear of the small default-dataset ids.
    fn random_product_id(existing: &[Product]) -> ProductId {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = ProductId::Int(rng.gen_range(10_000..1_000_000));
            if !existing.iter().any(|p| p.id == candidate) {
                return candidate;
            }
        }
    }

    fn random_order_id() -> String {
        format!("ord_{:08x}", rand::thread_rng().gen::<u32>())
    }
}

#[async_trait]
impl ProductStore for LocalOnlyStore {
    fn tag(&self) -> &'static str {
        "local"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.lock().await.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .find(|p| p.id == *id)
            .cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let mut products = self.products.lock().await;
        let record = Product {
            id: Self::random_product_id(&products),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock_quantity: product.stock_quantity,
            image_url: product.image_url.clone(),
            category: product.category.clone(),
            provenance: Default::default(),
        };
        products.insert(0, record.clone());
        Ok(record)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<(), StoreError> {
        let mut products = self.products.lock().await;
        match products.iter_mut().find(|p| p.id == *id) {
            Some(product) => {
                patch.apply_to(product);
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("product {}", id))),
        }
    }

    async fn update_stock(&self, id: &ProductId, stock_quantity: u32) -> Result<(), StoreError> {
        self.update_product(id, &ProductPatch::stock(stock_quantity))
            .await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        let mut products = self.products.lock().await;
        let before = products.len();
        products.retain(|p| p.id != *id);
        if products.len() == before {
            return Err(StoreError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }

    async fn delete_all_products(&self) -> Result<(), StoreError> {
        self.products.lock().await.clear();
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.lock().await.clone())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let record = order.clone().into_order(Self::random_order_id());
        self.orders.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().await;
        match orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("order {}", id))),
        }
    }

    async fn upload_image(&self, filename: &str, bytes: &[u8]) -> Result<String, StoreError> {
        Ok(data_url(filename, bytes))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::models::{CustomerInfo, LineItem, ProductSnapshot};
    use chrono::Utc;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            price: 99.0,
            stock_quantity: 10,
            image_url: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_a_fresh_id_and_prepends() {
        let store = LocalOnlyStore::new(defaults::default_products());
        let created = store.insert_product(&new_product("Kimbula Bun")).await.unwrap();

        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), 5);
        assert_eq!(products[0].id, created.id);
        assert!(defaults::default_products()
            .iter()
            .all(|p| p.id != created.id));
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let store = LocalOnlyStore::new(defaults::default_products());
        let id = ProductId::Int(1);

        store.update_stock(&id, 3).await.unwrap();
        let bread = store.get_product(&id).await.unwrap().unwrap();
        assert_eq!(bread.stock_quantity, 3);

        store.delete_product(&id).await.unwrap();
        assert!(store.get_product(&id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_product(&id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn orders_live_in_memory() {
        let store = LocalOnlyStore::new(Vec::new());
        let customer = CustomerInfo {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            address: None,
        };
        let new_order = NewOrder {
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            customer_phone: None,
            delivery_address: None,
            status: OrderStatus::Pending,
            total_price: 54.0,
            created_at: Utc::now(),
            items: vec![LineItem {
                product_id: ProductId::Int(2),
                quantity: 1,
                price_at_purchase: 50.0,
                product: ProductSnapshot {
                    name: "Bun".to_string(),
                    image_url: None,
                },
            }],
        };

        let placed = store.insert_order(&new_order).await.unwrap();
        assert!(placed.id.starts_with("ord_"));

        store
            .update_order_status(&placed.id, OrderStatus::Delivered)
            .await
            .unwrap();
        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders[0].status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn image_upload_inlines_a_data_url() {
        let store = LocalOnlyStore::new(Vec::new());
        let url = store.upload_image("bread.jpg", b"img").await.unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }
}
