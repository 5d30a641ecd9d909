//! Customer-facing storefront.
//!
//! Unlike the admin service, the storefront never serves stale data: every
//! catalog read reconciles the sources fresh, so a shopper always sees
//! current stock. Checkout creates the order first and only then walks the
//! line items decrementing stock; a failed decrement is logged and skipped
//! rather than rolling the order back, so concurrent checkouts can oversell.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::defaults;
use crate::models::{
    CustomerInfo, LineItem, NewOrder, Order, OrderStatus, Product, ProductSnapshot,
};
use crate::persist::LocalStore;
use crate::reconcile::{self, FallbackPolicy, Notice};
use crate::store::ProductStore;

/// Flat tax rate applied to the cart subtotal.
pub const TAX_RATE: f64 = 0.08;

/// One cart line: the product as the shopper saw it, and how many.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

pub struct Storefront {
    store: Arc<dyn ProductStore>,
    persist: LocalStore,
    notices: Vec<Notice>,
}

impl Storefront {
    pub fn new(store: Arc<dyn ProductStore>, persist: LocalStore) -> Self {
        Self {
            store,
            persist,
            notices: Vec::new(),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// The current catalog, reconciled on every call.
    pub async fn catalog(&mut self) -> Vec<Product> {
        let result = self.store.list_products().await;
        let remote = reconcile::remote_or_empty(result, "products", &mut self.notices);
        let local = self.persist.load_products().unwrap_or_default();
        let tombstones = self.persist.load_tombstones();
        reconcile::merge_products(
            remote,
            &local,
            &defaults::default_products(),
            &tombstones,
            FallbackPolicy::MergeAlways,
        )
    }

    /// Price a cart: subtotal, tax, and total.
    pub fn totals(cart: &[CartItem]) -> (f64, f64, f64) {
        let subtotal: f64 = cart
            .iter()
            .map(|item| item.product.price * item.quantity as f64)
            .sum();
        let tax = subtotal * TAX_RATE;
        (subtotal, tax, subtotal + tax)
    }

    /// Place an order for the cart contents.
    ///
    /// The order insert must succeed; the per-item stock decrements that
    /// follow are best-effort. Each decrement re-reads the product and
    /// writes back `stock - quantity`, clamped at zero. There is no
    /// transaction across items, and a decrement that fails leaves that
    /// product's stock untouched.
    pub async fn place_order(
        &mut self,
        customer: CustomerInfo,
        cart: &[CartItem],
    ) -> Result<Order> {
        if cart.is_empty() {
            bail!("cannot place an order with an empty cart");
        }

        let items: Vec<LineItem> = cart
            .iter()
            .map(|item| LineItem {
                product_id: item.product.id.clone(),
                quantity: item.quantity,
                price_at_purchase: item.product.price,
                product: ProductSnapshot {
                    name: item.product.name.clone(),
                    image_url: item.product.image_url.clone(),
                },
            })
            .collect();
        let (_, _, total) = Self::totals(cart);

        let new_order = NewOrder {
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            delivery_address: customer.address,
            status: OrderStatus::Pending,
            total_price: total,
            created_at: Utc::now(),
            items,
        };

        let order = self
            .store
            .insert_order(&new_order)
            .await
            .context("failed to place order")?;
        info!(order_id = %order.id, total = order.total_price, "Order placed");

        for item in cart {
            let id = &item.product.id;
            match self.store.get_product(id).await {
                Ok(Some(current)) => {
                    let remaining = current.stock_quantity.saturating_sub(item.quantity);
                    if let Err(e) = self.store.update_stock(id, remaining).await {
                        warn!(product_id = %id, error = %e, "Stock decrement failed");
                    }
                }
                Ok(None) => {
                    warn!(product_id = %id, "Ordered product no longer exists, skipping stock update");
                }
                Err(e) => {
                    warn!(product_id = %id, error = %e, "Could not re-read product for stock update");
                }
            }
        }

        Ok(order)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductId, Provenance};
    use crate::store::test_support::ScriptedStore;
    use std::sync::atomic::Ordering;

    fn temp_store(name: &str) -> LocalStore {
        let dir = std::env::temp_dir().join(format!(
            "bakeshop-shop-{}-{}",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_dir_all(&dir);
        LocalStore::new(&dir).unwrap()
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: None,
            address: Some("12 Main St".to_string()),
        }
    }

    fn cart_for(store_products: &[Product], picks: &[(&str, u32)]) -> Vec<CartItem> {
        picks
            .iter()
            .map(|(name, quantity)| CartItem {
                product: store_products
                    .iter()
                    .find(|p| p.name == *name)
                    .unwrap()
                    .clone(),
                quantity: *quantity,
            })
            .collect()
    }

    #[tokio::test]
    async fn catalog_is_never_cached() {
        let store = Arc::new(ScriptedStore::new(defaults::default_products()));
        let mut shop = Storefront::new(store.clone(), temp_store("no-cache"));

        shop.catalog().await;
        shop.catalog().await;
        assert_eq!(store.list_products_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn offline_catalog_falls_back_to_defaults() {
        let store = Arc::new(ScriptedStore::new(Vec::new()));
        store.fail_reads.store(true, Ordering::SeqCst);
        let mut shop = Storefront::new(store, temp_store("offline"));

        let catalog = shop.catalog().await;
        assert_eq!(catalog.len(), 4);
        assert!(catalog.iter().all(|p| p.provenance == Provenance::Mock));
    }

    #[tokio::test]
    async fn totals_apply_the_tax_rate() {
        let products = defaults::default_products();
        let cart = cart_for(&products, &[("Bread", 2), ("Bun", 1)]);

        let (subtotal, tax, total) = Storefront::totals(&cart);
        assert!((subtotal - 350.0).abs() < 1e-9);
        assert!((tax - 28.0).abs() < 1e-9);
        assert!((total - 378.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let store = Arc::new(ScriptedStore::new(defaults::default_products()));
        let mut shop = Storefront::new(store, temp_store("empty-cart"));

        assert!(shop.place_order(customer(), &[]).await.is_err());
    }

    #[tokio::test]
    async fn checkout_decrements_stock_per_item() {
        let store = Arc::new(ScriptedStore::new(defaults::default_products()));
        let mut shop = Storefront::new(store.clone(), temp_store("decrement"));

        let cart = cart_for(&defaults::default_products(), &[("Bread", 2), ("Bun", 60)]);
        let order = shop.place_order(customer(), &cart).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product.name, "Bread");

        let bread = store
            .get_product(&ProductId::Int(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bread.stock_quantity, 18);
        // Ordering more than is in stock clamps at zero instead of wrapping.
        let bun = store.get_product(&ProductId::Int(2)).await.unwrap().unwrap();
        assert_eq!(bun.stock_quantity, 0);
    }

    #[tokio::test]
    async fn failed_decrement_does_not_fail_the_order() {
        let store = Arc::new(ScriptedStore::new(defaults::default_products()));
        store
            .fail_stock_for
            .lock()
            .unwrap()
            .push(ProductId::Int(1));
        let mut shop = Storefront::new(store.clone(), temp_store("partial"));

        let cart = cart_for(&defaults::default_products(), &[("Bread", 2), ("Bun", 3)]);
        let order = shop.place_order(customer(), &cart).await.unwrap();
        assert!(order.id.starts_with("ord_"));

        // Bread's decrement failed and its stock is untouched; Bun's went
        // through.
        let bread = store
            .get_product(&ProductId::Int(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bread.stock_quantity, 20);
        let bun = store.get_product(&ProductId::Int(2)).await.unwrap().unwrap();
        assert_eq!(bun.stock_quantity, 47);
    }

    #[tokio::test]
    async fn unreachable_store_fails_the_checkout() {
        let store = Arc::new(ScriptedStore::new(defaults::default_products()));
        store.fail_writes.store(true, Ordering::SeqCst);
        let mut shop = Storefront::new(store, temp_store("unreachable"));

        let cart = cart_for(&defaults::default_products(), &[("Bread", 1)]);
        assert!(shop.place_order(customer(), &cart).await.is_err());
    }
}
