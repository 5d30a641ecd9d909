//! Source reconciliation.
//!
//! Builds a working set out of up to three tiers: the remote store
//! (authoritative when reachable and non-empty), the local persisted store
//! (authoritative for records added while the remote was unreachable), and
//! the compiled-in defaults (ultimate fallback, always copied). A record is
//! a duplicate of an existing entry when either its id or its name matches;
//! the earlier tier wins.

use tracing::{debug, warn};

use crate::cache::DatasetKey;
use crate::models::{Order, Product, Provenance};
use crate::persist::Tombstone;
use crate::store::StoreError;

/// How aggressively the defaults tier is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Defaults are always checked and appended when absent.
    MergeAlways,
    /// Defaults are only used when the working set is still empty.
    OnEmptyOnly,
}

impl FallbackPolicy {
    /// Per-key default: the catalog merges defaults into partial results so
    /// the storefront never looks half-empty; order history only falls back
    /// wholesale, since mixing sample orders into real ones would corrupt
    /// the revenue figures.
    pub fn default_for(key: DatasetKey) -> Self {
        match key {
            DatasetKey::Products => FallbackPolicy::MergeAlways,
            DatasetKey::Orders | DatasetKey::SalesData | DatasetKey::Stats => {
                FallbackPolicy::OnEmptyOnly
            }
        }
    }
}

/// A non-blocking notification for the view layer to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub detail: String,
}

/// Fold a remote fetch result into a working set, degrading to empty on
/// failure. Expected failures (offline, permission denied) stay quiet;
/// anything else produces a notice.
pub fn remote_or_empty<T>(
    result: Result<Vec<T>, StoreError>,
    dataset: &str,
    notices: &mut Vec<Notice>,
) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(e) if e.is_expected() => {
            debug!(dataset, error = %e, "Remote fetch failed, degrading to fallback tiers");
            Vec::new()
        }
        Err(e) => {
            warn!(dataset, error = %e, "Unexpected remote failure");
            notices.push(Notice {
                title: format!("Error loading {}", dataset),
                detail: e.to_string(),
            });
            Vec::new()
        }
    }
}

fn is_duplicate(working: &[Product], candidate: &Product) -> bool {
    working
        .iter()
        .any(|p| p.id == candidate.id || p.name == candidate.name)
}

/// Merge the three product tiers into one deduplicated, name-sorted list.
///
/// Remote records pass through unmodified apart from the `Remote` tag.
/// Tombstones only suppress the defaults tier: a deleted default product
/// stays gone until restore-defaults, but a record the remote re-grew is
/// the remote's business.
pub fn merge_products(
    remote: Vec<Product>,
    local: &[Product],
    defaults: &[Product],
    tombstones: &[Tombstone],
    policy: FallbackPolicy,
) -> Vec<Product> {
    let mut working: Vec<Product> = remote
        .into_iter()
        .map(|p| Product {
            provenance: Provenance::Remote,
            ..p
        })
        .collect();

    for record in local {
        if !is_duplicate(&working, record) {
            working.push(record.with_provenance(Provenance::Local));
        }
    }

    let merge_defaults = match policy {
        FallbackPolicy::MergeAlways => true,
        FallbackPolicy::OnEmptyOnly => working.is_empty(),
    };
    if merge_defaults {
        for record in defaults {
            let deleted = tombstones.iter().any(|t| t.matches(record));
            if !deleted && !is_duplicate(&working, record) {
                working.push(record.with_provenance(Provenance::Mock));
            }
        }
    }

    working.sort_by(|a, b| a.name.cmp(&b.name));
    working
}

/// Merge remote orders with the default order history, newest first.
/// Orders have no name, so identity is the id alone.
pub fn merge_orders(
    remote: Vec<Order>,
    defaults: &[Order],
    policy: FallbackPolicy,
) -> Vec<Order> {
    let mut working = remote;

    let merge_defaults = match policy {
        FallbackPolicy::MergeAlways => true,
        FallbackPolicy::OnEmptyOnly => working.is_empty(),
    };
    if merge_defaults {
        for record in defaults {
            if !working.iter().any(|o| o.id == record.id) {
                working.push(record.clone());
            }
        }
    }

    working.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    working
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::models::ProductId;

    fn product(id: i64, name: &str, stock: u32) -> Product {
        Product {
            id: ProductId::Int(id),
            name: name.to_string(),
            description: None,
            price: 100.0,
            stock_quantity: stock,
            image_url: None,
            category: None,
            provenance: Provenance::Remote,
        }
    }

    #[test]
    fn cold_start_with_no_remote_yields_the_sorted_defaults() {
        let mut notices = Vec::new();
        let remote = remote_or_empty::<Product>(
            Err(StoreError::Unavailable("offline".to_string())),
            "products",
            &mut notices,
        );
        assert!(notices.is_empty(), "expected failures stay quiet");

        let merged = merge_products(
            remote,
            &[],
            &defaults::default_products(),
            &[],
            FallbackPolicy::MergeAlways,
        );
        let names: Vec<&str> = merged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bread", "Bun", "Fish Bun", "Viyan Roll"]);
        assert!(merged.iter().all(|p| p.provenance == Provenance::Mock));
    }

    #[test]
    fn unexpected_remote_failure_produces_a_notice() {
        let mut notices = Vec::new();
        let remote = remote_or_empty::<Product>(
            Err(StoreError::InvalidResponse("garbled".to_string())),
            "products",
            &mut notices,
        );
        assert!(remote.is_empty());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Error loading products");
    }

    #[test]
    fn local_record_overrides_the_matching_default_by_name() {
        let local = vec![product(901, "Bread", 5)];
        let merged = merge_products(
            Vec::new(),
            &local,
            &defaults::default_products(),
            &[],
            FallbackPolicy::MergeAlways,
        );

        let breads: Vec<&Product> = merged.iter().filter(|p| p.name == "Bread").collect();
        assert_eq!(breads.len(), 1);
        assert_eq!(breads[0].stock_quantity, 5);
        assert_eq!(breads[0].provenance, Provenance::Local);
        // The other three defaults still fill out the catalog.
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn remote_records_pass_through_unmodified_and_win_duplicates() {
        let remote = vec![product(1, "Bread", 7)];
        let local = vec![product(1, "Sourdough", 2), product(50, "Bread", 3)];
        let merged = merge_products(
            remote,
            &local,
            &[],
            &[],
            FallbackPolicy::MergeAlways,
        );

        // Both local records collide with the remote one: the first by id,
        // the second by name.
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Bread");
        assert_eq!(merged[0].stock_quantity, 7);
        assert_eq!(merged[0].provenance, Provenance::Remote);
    }

    #[test]
    fn unmatched_local_records_are_tagged_local() {
        let remote = vec![product(1, "Bread", 7)];
        let local = vec![product(50, "Kimbula Bun", 3)];
        let merged = merge_products(remote, &local, &[], &[], FallbackPolicy::MergeAlways);

        assert_eq!(merged.len(), 2);
        let kimbula = merged.iter().find(|p| p.name == "Kimbula Bun").unwrap();
        assert_eq!(kimbula.provenance, Provenance::Local);
    }

    #[test]
    fn tombstones_keep_deleted_defaults_out() {
        let tombstones = vec![Tombstone {
            id: ProductId::Int(1),
            name: "Bread".to_string(),
        }];
        let merged = merge_products(
            Vec::new(),
            &[],
            &defaults::default_products(),
            &tombstones,
            FallbackPolicy::MergeAlways,
        );
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|p| p.name != "Bread"));
    }

    #[test]
    fn on_empty_only_skips_defaults_when_anything_was_found() {
        let remote = vec![product(9, "Croissant", 4)];
        let merged = merge_products(
            remote,
            &[],
            &defaults::default_products(),
            &[],
            FallbackPolicy::OnEmptyOnly,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Croissant");
    }

    #[test]
    fn orders_fall_back_wholesale_and_sort_newest_first() {
        let sample = defaults::default_orders();

        let merged = merge_orders(Vec::new(), &sample, FallbackPolicy::OnEmptyOnly);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].created_at >= merged[1].created_at);

        // A single real order suppresses the sample history entirely.
        let real = vec![sample[0].clone()];
        let merged = merge_orders(real, &sample, FallbackPolicy::OnEmptyOnly);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn product_order_is_case_sensitive_lexicographic() {
        let remote = vec![
            product(1, "bagel", 1),
            product(2, "Bagel", 1),
            product(3, "Zopf", 1),
        ];
        let merged = merge_products(remote, &[], &[], &[], FallbackPolicy::OnEmptyOnly);
        let names: Vec<&str> = merged.iter().map(|p| p.name.as_str()).collect();
        // Uppercase sorts before lowercase in a byte-wise comparison.
        assert_eq!(names, vec!["Bagel", "Zopf", "bagel"]);
    }
}
