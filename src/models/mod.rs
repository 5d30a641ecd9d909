//! Data models for bakery storefront entities.
//!
//! This module contains all the data structures used to represent
//! catalog and order data:
//!
//! - `Product`, `NewProduct`, `ProductPatch`: catalog records and payloads
//! - `Order`, `LineItem`, `CustomerInfo`: order records with line items
//! - `SalesRow`, `SalesStats`: datasets derived from the order history

pub mod order;
pub mod product;
pub mod sales;

pub use order::{CustomerInfo, LineItem, NewOrder, Order, OrderStatus, ProductSnapshot};
pub use product::{NewProduct, Product, ProductId, ProductPatch, Provenance, StockStatus};
pub use sales::{sales_from_orders, stats_from_orders, SalesRow, SalesStats, TopProduct};
