//! Catalog product records.
//!
//! These types represent products in a clean domain format, decoupled from
//! the wire structures of the individual store backends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stock level below which a product counts as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Product identity.
///
/// The document backend issues string document ids while the relational
/// backend and the compiled-in defaults use integer ids, so both shapes
/// must be representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Int(n) => write!(f, "{}", n),
            ProductId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ProductId {
    fn from(n: i64) -> Self {
        ProductId::Int(n)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId::Str(s.to_string())
    }
}

/// Which source a record came from.
///
/// Assigned during reconciliation only; the store backends never send this
/// over the wire. It is serialized so the local persisted store can
/// round-trip its own records, with the `Remote` default omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Remote,
    Local,
    Mock,
}

impl Provenance {
    pub fn is_remote(&self) -> bool {
        matches!(self, Provenance::Remote)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock_quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Provenance::is_remote")]
    pub provenance: Provenance,
}

impl Product {
    /// Return a copy of this record carrying the given provenance tag.
    pub fn with_provenance(&self, provenance: Provenance) -> Self {
        Self {
            provenance,
            ..self.clone()
        }
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.stock_quantity)
    }
}

/// Stock level classification used by the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: u32) -> Self {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity < LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::InStock => "In Stock",
        }
    }
}

/// Payload for creating a product. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock_quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<&Product> for NewProduct {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            stock_quantity: p.stock_quantity,
            image_url: p.image_url.clone(),
            category: p.category.clone(),
        }
    }
}

/// Partial update for a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductPatch {
    /// A patch that only changes the stock quantity.
    pub fn stock(quantity: u32) -> Self {
        Self {
            stock_quantity: Some(quantity),
            ..Default::default()
        }
    }

    /// Apply this patch to a product in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(ref name) = self.name {
            product.name = name.clone();
        }
        if let Some(ref description) = self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock_quantity) = self.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        if let Some(ref image_url) = self.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(ref category) = self.category {
            product.category = Some(category.clone());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_accepts_both_shapes() {
        let int: ProductId = serde_json::from_str("7").unwrap();
        assert_eq!(int, ProductId::Int(7));

        let s: ProductId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(s, ProductId::Str("abc123".to_string()));
    }

    #[test]
    fn provenance_default_is_omitted_when_serialized() {
        let product = Product {
            id: ProductId::Int(1),
            name: "Bread".to_string(),
            description: None,
            price: 150.0,
            stock_quantity: 20,
            image_url: None,
            category: None,
            provenance: Provenance::Remote,
        };
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("provenance").is_none());

        let tagged = product.with_provenance(Provenance::Local);
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["provenance"], "local");
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(StockStatus::from_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(4), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(5), StockStatus::InStock);
    }

    #[test]
    fn patch_leaves_unset_fields_alone() {
        let mut product = Product {
            id: ProductId::Int(1),
            name: "Bread".to_string(),
            description: Some("Artisan".to_string()),
            price: 150.0,
            stock_quantity: 20,
            image_url: None,
            category: Some("Bread".to_string()),
            provenance: Provenance::Remote,
        };

        ProductPatch::stock(3).apply_to(&mut product);
        assert_eq!(product.stock_quantity, 3);
        assert_eq!(product.name, "Bread");
        assert_eq!(product.price, 150.0);
        assert_eq!(product.description.as_deref(), Some("Artisan"));
    }
}
