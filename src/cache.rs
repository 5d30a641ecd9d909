//! In-memory admin dashboard cache.
//!
//! The four admin views (products, stock, orders, sales) may mount and
//! unmount independently while the operator switches tabs; this cache keeps
//! each view's dataset for a short window so tab switching does not trigger
//! redundant fetch-and-reconcile passes. The public storefront deliberately
//! bypasses it and always fetches fresh.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Order, Product, SalesRow, SalesStats};

/// Consider a cache entry stale after 5 minutes.
/// Acceptable staleness for a back-office view; the key set is fixed and
/// small, so no eviction beyond expiry is needed.
pub const CACHE_TTL_MINUTES: i64 = 5;

/// The four cached admin datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKey {
    Products,
    Orders,
    SalesData,
    Stats,
}

impl DatasetKey {
    pub const ALL: [DatasetKey; 4] = [
        DatasetKey::Products,
        DatasetKey::Orders,
        DatasetKey::SalesData,
        DatasetKey::Stats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::Products => "products",
            DatasetKey::Orders => "orders",
            DatasetKey::SalesData => "sales_data",
            DatasetKey::Stats => "stats",
        }
    }
}

/// Payload plus the instant it was cached. Stored together so an entry can
/// never hold data without a timestamp or vice versa.
#[derive(Debug, Clone)]
struct Filled<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// One cache slot.
///
/// `loading` lets a view show a spinner without discarding stale-but-
/// displayable data; `set` replaces the slot wholesale and clears it.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    filled: Option<Filled<T>>,
    loading: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            filled: None,
            loading: false,
        }
    }
}

impl<T> CacheEntry<T> {
    /// The cached payload, if present and fresh. A miss is absence, not an
    /// error.
    pub fn get(&self) -> Option<&T> {
        match &self.filled {
            Some(filled) if Self::fresh(filled.cached_at) => Some(&filled.data),
            _ => None,
        }
    }

    /// Replace the entry wholesale, stamping the current time and clearing
    /// the loading flag.
    pub fn set(&mut self, data: T) {
        self.filled = Some(Filled {
            data,
            cached_at: Utc::now(),
        });
        self.loading = false;
    }

    /// Update only the loading flag, preserving data and timestamp.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Pure freshness predicate, no side effects.
    pub fn is_valid(&self) -> bool {
        self.filled
            .as_ref()
            .is_some_and(|filled| Self::fresh(filled.cached_at))
    }

    /// Reset to the empty state.
    pub fn invalidate(&mut self) {
        self.filled = None;
        self.loading = false;
    }

    fn fresh(cached_at: DateTime<Utc>) -> bool {
        Utc::now() - cached_at < Duration::minutes(CACHE_TTL_MINUTES)
    }

    /// Age the entry, for expiry tests.
    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        if let Some(filled) = self.filled.as_mut() {
            filled.cached_at -= by;
        }
    }
}

/// Per-key TTL cache for the admin dashboard.
///
/// An explicit object injected into the admin service, not ambient state.
/// All access happens from a single cooperative scheduling context, so
/// mutations never interleave mid-update and last-writer-wins is safe.
#[derive(Debug, Clone, Default)]
pub struct AdminCache {
    pub products: CacheEntry<Vec<Product>>,
    pub orders: CacheEntry<Vec<Order>>,
    pub sales: CacheEntry<Vec<SalesRow>>,
    pub stats: CacheEntry<SalesStats>,
}

impl AdminCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset one entry to the empty state.
    pub fn invalidate(&mut self, key: DatasetKey) {
        match key {
            DatasetKey::Products => self.products.invalidate(),
            DatasetKey::Orders => self.orders.invalidate(),
            DatasetKey::SalesData => self.sales.invalidate(),
            DatasetKey::Stats => self.stats.invalidate(),
        }
    }

    /// Reset all four entries.
    pub fn invalidate_all(&mut self) {
        for key in DatasetKey::ALL {
            self.invalidate(key);
        }
    }

    pub fn is_valid(&self, key: DatasetKey) -> bool {
        match key {
            DatasetKey::Products => self.products.is_valid(),
            DatasetKey::Orders => self.orders.is_valid(),
            DatasetKey::SalesData => self.sales.is_valid(),
            DatasetKey::Stats => self.stats.is_valid(),
        }
    }

    pub fn set_loading(&mut self, key: DatasetKey, loading: bool) {
        match key {
            DatasetKey::Products => self.products.set_loading(loading),
            DatasetKey::Orders => self.orders.set_loading(loading),
            DatasetKey::SalesData => self.sales.set_loading(loading),
            DatasetKey::Stats => self.stats.set_loading(loading),
        }
    }

    pub fn is_loading(&self, key: DatasetKey) -> bool {
        match key {
            DatasetKey::Products => self.products.is_loading(),
            DatasetKey::Orders => self.orders.is_loading(),
            DatasetKey::SalesData => self.sales.is_loading(),
            DatasetKey::Stats => self.stats.is_loading(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
