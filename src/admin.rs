//! Admin dashboard service.
//!
//! Owns the dataset cache and the write-through path. Reads reconcile the
//! remote store, the local persisted store, and the compiled-in defaults,
//! then cache the result for the TTL window. Mutations go to the remote
//! store best-effort, always land in local persistence, and invalidate the
//! affected cache keys so the next read refetches.

use std::sync::Arc;

use anyhow::{bail, Result};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::cache::{AdminCache, DatasetKey};
use crate::defaults;
use crate::models::{
    sales_from_orders, stats_from_orders, NewProduct, Order, OrderStatus, Product, ProductId,
    ProductPatch, Provenance, SalesRow, SalesStats,
};
use crate::persist::LocalStore;
use crate::reconcile::{self, FallbackPolicy, Notice};
use crate::store::ProductStore;

/// Upload size cap for product images, in bytes.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub struct AdminService {
    store: Arc<dyn ProductStore>,
    persist: LocalStore,
    cache: AdminCache,
    product_fallback: FallbackPolicy,
    order_fallback: FallbackPolicy,
    notices: Vec<Notice>,
}

impl AdminService {
    pub fn new(store: Arc<dyn ProductStore>, persist: LocalStore) -> Self {
        Self {
            store,
            persist,
            cache: AdminCache::default(),
            product_fallback: FallbackPolicy::default_for(DatasetKey::Products),
            order_fallback: FallbackPolicy::default_for(DatasetKey::Orders),
            notices: Vec::new(),
        }
    }

    /// Drain the accumulated user-facing notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Surface a remote failure as a notice unless it is the expected
    /// consequence of running without a reachable backend.
    fn notice_unexpected(&mut self, error: &crate::store::StoreError, title: &str) {
        if !error.is_expected() {
            self.notices.push(Notice {
                title: title.to_string(),
                detail: error.to_string(),
            });
        }
    }

    pub fn invalidate(&mut self, key: DatasetKey) {
        self.cache.invalidate(key);
    }

    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    // ========================================================================
    // Cached reads
    // ========================================================================

    /// The reconciled product catalog, cached for the TTL window.
    pub async fn products(&mut self) -> Vec<Product> {
        if let Some(cached) = self.cache.products.get() {
            debug!("Serving products from cache");
            return cached.clone();
        }

        self.cache.set_loading(DatasetKey::Products, true);
        let result = self.store.list_products().await;
        let remote = reconcile::remote_or_empty(result, "products", &mut self.notices);
        let local = self.persist.load_products().unwrap_or_default();
        let tombstones = self.persist.load_tombstones();
        let merged = reconcile::merge_products(
            remote,
            &local,
            &defaults::default_products(),
            &tombstones,
            self.product_fallback,
        );

        // Write the reconciled view back, minus the defaults tier, so the
        // local tier converges without adopting sample records as its own.
        let durable: Vec<Product> = merged
            .iter()
            .filter(|p| p.provenance != Provenance::Mock)
            .cloned()
            .collect();
        if let Err(e) = self.persist.save_products(&durable) {
            warn!(error = %e, "Failed to persist reconciled products");
        }
        self.cache.products.set(merged.clone());
        merged
    }

    /// Order history, newest first, cached for the TTL window.
    pub async fn orders(&mut self) -> Vec<Order> {
        if let Some(cached) = self.cache.orders.get() {
            debug!("Serving orders from cache");
            return cached.clone();
        }

        self.cache.set_loading(DatasetKey::Orders, true);
        let result = self.store.list_orders().await;
        let remote = reconcile::remote_or_empty(result, "orders", &mut self.notices);
        let merged =
            reconcile::merge_orders(remote, &defaults::default_orders(), self.order_fallback);
        self.cache.orders.set(merged.clone());
        merged
    }

    /// Flattened per-item sales history derived from the order log.
    pub async fn sales(&mut self) -> Vec<SalesRow> {
        if let Some(cached) = self.cache.sales.get() {
            return cached.clone();
        }
        self.cache.set_loading(DatasetKey::SalesData, true);
        let rows = sales_from_orders(&self.orders().await);
        self.cache.sales.set(rows.clone());
        rows
    }

    /// Aggregate revenue and top-product figures.
    pub async fn stats(&mut self) -> SalesStats {
        if let Some(cached) = self.cache.stats.get() {
            return cached.clone();
        }
        self.cache.set_loading(DatasetKey::Stats, true);
        let stats = stats_from_orders(&self.orders().await);
        self.cache.stats.set(stats.clone());
        stats
    }

    /// Filter the order history by a free-text query (matched against
    /// customer name, email, and order id, case-insensitively) and an
    /// optional status.
    pub async fn search_orders(
        &mut self,
        query: &str,
        status: Option<OrderStatus>,
    ) -> Vec<Order> {
        let needle = query.trim().to_lowercase();
        self.orders()
            .await
            .into_iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .filter(|o| {
                needle.is_empty()
                    || o.customer_name.to_lowercase().contains(&needle)
                    || o.customer_email.to_lowercase().contains(&needle)
                    || o.id.to_lowercase().contains(&needle)
            })
            .collect()
    }

    // ========================================================================
    // Write-through mutations
    // ========================================================================

    /// Create a product. The remote write is best-effort: on any remote
    /// failure the product is created locally with a random id and survives
    /// in local persistence until the remote comes back.
    pub async fn add_product(&mut self, new: NewProduct) -> Result<Product> {
        let created = match self.store.insert_product(&new).await {
            Ok(product) => product,
            Err(e) => {
                warn!(error = %e, "Remote insert failed, creating product locally");
                self.notice_unexpected(&e, "Product saved locally only");
                Product {
                    id: ProductId::Int(rand::thread_rng().gen_range(10_000..1_000_000)),
                    name: new.name,
                    description: new.description,
                    price: new.price,
                    stock_quantity: new.stock_quantity,
                    image_url: new.image_url,
                    category: new.category,
                    provenance: Provenance::Local,
                }
            }
        };

        let mut local = self.persist.load_products().unwrap_or_default();
        local.retain(|p| p.id != created.id);
        local.insert(0, created.clone());
        self.persist.save_products(&local)?;

        self.cache.invalidate(DatasetKey::Products);
        info!(id = %created.id, name = %created.name, "Product created");
        Ok(created)
    }

    /// Apply a partial update. Remote is best-effort; the persisted copy is
    /// always patched so the change survives a reload.
    pub async fn update_product(&mut self, id: &ProductId, patch: ProductPatch) -> Result<()> {
        if let Err(e) = self.store.update_product(id, &patch).await {
            warn!(id = %id, error = %e, "Remote update failed, keeping local change");
            self.notice_unexpected(&e, "Product update not synced");
        }

        let mut local = self.persist.load_products().unwrap_or_default();
        if let Some(product) = local.iter_mut().find(|p| p.id == *id) {
            patch.apply_to(product);
            self.persist.save_products(&local)?;
        }

        self.cache.invalidate(DatasetKey::Products);
        Ok(())
    }

    pub async fn set_stock(&mut self, id: &ProductId, stock_quantity: u32) -> Result<()> {
        self.update_product(id, ProductPatch::stock(stock_quantity))
            .await
    }

    /// Delete a product everywhere and tombstone it so a matching default
    /// does not reappear on the next reconcile.
    pub async fn delete_product(&mut self, id: &ProductId) -> Result<()> {
        let known = self.products().await;
        let record = known.iter().find(|p| p.id == *id);

        if let Err(e) = self.store.delete_product(id).await {
            warn!(id = %id, error = %e, "Remote delete skipped");
            if !matches!(e, crate::store::StoreError::NotFound(_)) {
                self.notice_unexpected(&e, "Product delete not synced");
            }
        }

        if let Some(product) = record {
            self.persist.add_tombstone(product)?;
        }
        let mut local = self.persist.load_products().unwrap_or_default();
        local.retain(|p| p.id != *id);
        self.persist.save_products(&local)?;

        self.cache.invalidate(DatasetKey::Products);
        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Change an order's status. Derived datasets are invalidated along
    /// with the order list.
    pub async fn update_order_status(&mut self, id: &str, status: OrderStatus) -> Result<()> {
        match self.store.update_order_status(id, status).await {
            Ok(()) => {}
            Err(e) if e.is_expected() => {
                warn!(order_id = id, error = %e, "Remote status update failed");
                self.notices.push(Notice {
                    title: "Order update not saved".to_string(),
                    detail: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        self.cache.invalidate(DatasetKey::Orders);
        self.cache.invalidate(DatasetKey::SalesData);
        self.cache.invalidate(DatasetKey::Stats);
        info!(order_id = id, status = status.as_str(), "Order status updated");
        Ok(())
    }

    /// Wipe every product and reseed the default catalog. Unlike the other
    /// mutations this one propagates remote failures: a half-restored
    /// catalog is worse than a failed restore.
    pub async fn restore_defaults(&mut self) -> Result<()> {
        self.persist.clear()?;
        self.store.delete_all_products().await?;
        for product in &defaults::default_products() {
            self.store.insert_product(&NewProduct::from(product)).await?;
        }
        self.cache.invalidate_all();
        info!("Default catalog restored");
        Ok(())
    }

    /// Upload a product image, falling back to an inline data URL when the
    /// remote storage endpoint is unreachable. Oversized uploads fail.
    pub async fn upload_image(&mut self, filename: &str, bytes: &[u8]) -> Result<String> {
        if bytes.len() > MAX_IMAGE_BYTES {
            bail!(
                "image {} is {} bytes, over the {} byte limit",
                filename,
                bytes.len(),
                MAX_IMAGE_BYTES
            );
        }
        match self.store.upload_image(filename, bytes).await {
            Ok(url) => Ok(url),
            Err(e) if e.is_expected() => {
                warn!(filename, error = %e, "Upload failed, inlining image as data URL");
                Ok(crate::store::data_url(filename, bytes))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
