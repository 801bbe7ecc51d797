use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a catalog product.
///
/// `OutOfStock` is derived: any stock write that lands on zero sets it, and
/// a restock that raises stock from zero restores `Active`. An explicit
/// `Inactive` set by staff survives stock changes in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::OutOfStock => "out_of_stock",
        };
        f.write_str(s)
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub status: ProductStatus,
    pub category: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Writes a new stock level and keeps `status` in sync with it.
    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
        if self.status != ProductStatus::Inactive {
            self.status = if stock == 0 {
                ProductStatus::OutOfStock
            } else {
                ProductStatus::Active
            };
        }
    }
}

/// Payload for creating a new product.
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
    pub featured: bool,
}

/// Payload for updating an existing product.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub status: Option<ProductStatus>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

/// Listing filter for the catalog. All criteria are conjunctive; `search`
/// matches case-insensitively over name, description, and SKU.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
}

impl Product {
    pub fn matches(&self, filter: &ProductFilter) -> bool {
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        if let Some(category) = &filter.category {
            if &self.category != category {
                return false;
            }
        }
        if let Some(featured) = filter.featured {
            if self.featured != featured {
                return false;
            }
        }
        if let Some(min) = filter.min_price {
            if self.price < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price {
            if self.price > max {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            let hit = self.name.to_lowercase().contains(&needle)
                || self.description.to_lowercase().contains(&needle)
                || self.sku.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Product {
        let now = Utc::now();
        Product {
            id: "product_1".to_string(),
            name: "Old Tom Gin".to_string(),
            sku: "GIN-OT-70".to_string(),
            description: "Sweeter style, 70cl".to_string(),
            price: dec!(32.50),
            stock: 4,
            status: ProductStatus::Active,
            category: "old-tom".to_string(),
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stock_writes_track_status() {
        let mut product = sample();
        product.set_stock(0);
        assert_eq!(product.status, ProductStatus::OutOfStock);
        product.set_stock(6);
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[test]
    fn inactive_survives_restock() {
        let mut product = sample();
        product.status = ProductStatus::Inactive;
        product.set_stock(0);
        assert_eq!(product.status, ProductStatus::Inactive);
        product.set_stock(10);
        assert_eq!(product.status, ProductStatus::Inactive);
    }

    #[test]
    fn filter_matches_search_and_price_range() {
        let product = sample();
        let filter = ProductFilter {
            search: Some("old tom".to_string()),
            min_price: Some(dec!(30)),
            max_price: Some(dec!(40)),
            ..Default::default()
        };
        assert!(product.matches(&filter));

        let miss = ProductFilter {
            search: Some("navy strength".to_string()),
            ..Default::default()
        };
        assert!(!product.matches(&miss));
    }
}
