//! Product store backends.
//!
//! The remote source is one polymorphic capability with three
//! interchangeable implementations, selected once at startup:
//!
//! - [`FirestoreStore`]: document-database REST backend
//! - [`PostgrestStore`]: relational REST backend
//! - [`LocalOnlyStore`]: in-memory fallback when nothing is configured
//!
//! All failures surface as [`StoreError`]; callers decide whether a failure
//! is expected (degrade silently) or worth a notice.

pub mod error;
mod firestore;
mod local;
mod postgrest;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

use crate::config::Config;
use crate::defaults;
use crate::models::{NewOrder, NewProduct, Order, OrderStatus, Product, ProductId, ProductPatch};
use crate::persist::LocalStore;

pub use error::StoreError;
pub use firestore::FirestoreStore;
pub use local::LocalOnlyStore;
pub use postgrest::PostgrestStore;

/// Collection-style reads and point writes over products and orders.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Short backend name for logging and connection status display.
    fn tag(&self) -> &'static str;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError>;

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<(), StoreError>;

    async fn update_stock(&self, id: &ProductId, stock_quantity: u32) -> Result<(), StoreError>;

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError>;

    /// Remove every product. Only used by restore-defaults before reseeding.
    async fn delete_all_products(&self) -> Result<(), StoreError>;

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, StoreError>;

    async fn update_order_status(&self, id: &str, status: OrderStatus)
        -> Result<(), StoreError>;

    /// Upload an image, returning a URL for it.
    async fn upload_image(&self, filename: &str, bytes: &[u8]) -> Result<String, StoreError>;
}

/// Pick the store implementation for the current configuration.
///
/// The local-only store seeds its product list from the persisted store, or
/// the compiled-in defaults when nothing was ever persisted.
pub fn select_store(config: &Config, persist: &LocalStore) -> Result<Arc<dyn ProductStore>> {
    let store: Arc<dyn ProductStore> = if let Some(cfg) = &config.firestore {
        Arc::new(FirestoreStore::new(cfg)?)
    } else if let Some(cfg) = &config.supabase {
        Arc::new(PostgrestStore::new(cfg)?)
    } else {
        let seed = persist
            .load_products()
            .unwrap_or_else(defaults::default_products);
        Arc::new(LocalOnlyStore::new(seed))
    };
    info!(backend = store.tag(), "Product store selected");
    Ok(store)
}

/// Inline a small image as a base64 data URL. Fallback for when the remote
/// upload endpoint is unreachable.
pub(crate) fn data_url(filename: &str, bytes: &[u8]) -> String {
    let mime = match filename.rsplit('.').next().map(str::to_ascii_lowercase) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "svg" => "image/svg+xml",
        _ => "image/png",
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

// ============================================================================
// Test support
// ============================================================================
