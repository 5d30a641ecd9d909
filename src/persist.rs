//! Local persisted store.
//!
//! A synchronous string-keyed JSON store, one value per key as a
//! `{key}.json` file under a data directory. It survives restarts on one
//! machine and is never shared across devices. Products added or edited
//! while the remote store is unreachable live here, so the local copy never
//! diverges from user intent.
//!
//! A missing or corrupt value is treated as absent: logged, never fatal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::models::{Product, ProductId};

/// Fixed key for the persisted product array.
const PRODUCTS_KEY: &str = "bakery_products";

/// Fixed key for deletion tombstones. A deleted default product must not
/// reappear on the next reconcile until an explicit restore-defaults wipes
/// this list.
const TOMBSTONES_KEY: &str = "bakery_deleted_products";

/// Marker for a deleted product, matched by id or name like the reconciler
/// does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tombstone {
    pub id: ProductId,
    pub name: String,
}

impl Tombstone {
    pub fn for_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
        }
    }

    /// Whether this tombstone suppresses the given record.
    pub fn matches(&self, product: &Product) -> bool {
        self.id == product.id || self.name == product.name
    }
}

/// File-backed local store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read a key. Missing file or unparseable contents both come back as
    /// `None`; corruption is logged and the value abandoned.
    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        if !path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(key, error = %e, "Failed to read local store value");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Corrupt local store value, treating as absent");
                None
            }
        }
    }

    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path(key), contents)
            .with_context(|| format!("Failed to write local store value: {}", key))?;
        Ok(())
    }

    /// The persisted product array. `None` means the store was never
    /// written (distinct from an empty array).
    pub fn load_products(&self) -> Option<Vec<Product>> {
        self.read_key(PRODUCTS_KEY)
    }

    pub fn save_products(&self, products: &[Product]) -> Result<()> {
        self.write_key(PRODUCTS_KEY, &products)
    }

    pub fn load_tombstones(&self) -> Vec<Tombstone> {
        self.read_key(TOMBSTONES_KEY).unwrap_or_default()
    }

    pub fn add_tombstone(&self, product: &Product) -> Result<()> {
        let mut tombstones = self.load_tombstones();
        let tombstone = Tombstone::for_product(product);
        if !tombstones.contains(&tombstone) {
            tombstones.push(tombstone);
        }
        self.write_key(TOMBSTONES_KEY, &tombstones)
    }

    /// Wipe all persisted state. Used by restore-defaults.
    pub fn clear(&self) -> Result<()> {
        for key in [PRODUCTS_KEY, TOMBSTONES_KEY] {
            let path = self.path(key);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove local store value: {}", key))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
