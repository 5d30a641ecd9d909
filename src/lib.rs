//! Bakeshop: an offline-tolerant bakery commerce core.
//!
//! Product and order data lives in a remote store (a document database or a
//! relational REST backend) that may be unconfigured, unreachable, or
//! denying access at any moment. Every read reconciles three tiers into one
//! working set: the remote store, a local persisted store for records
//! created while offline, and a compiled-in default catalog. The admin
//! surface caches reconciled datasets for a short TTL and invalidates on
//! write; the storefront reconciles fresh on every read.

pub mod admin;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod models;
pub mod persist;
pub mod reconcile;
pub mod shop;
pub mod store;

pub use admin::AdminService;
pub use cache::{AdminCache, DatasetKey, CACHE_TTL_MINUTES};
pub use config::{BackendKind, Config};
pub use models::{
    CustomerInfo, LineItem, NewOrder, NewProduct, Order, OrderStatus, Product, ProductId,
    ProductPatch, Provenance, SalesRow, SalesStats, StockStatus,
};
pub use persist::LocalStore;
pub use reconcile::{FallbackPolicy, Notice};
pub use shop::{CartItem, Storefront, TAX_RATE};
pub use store::{select_store, ProductStore, StoreError};
