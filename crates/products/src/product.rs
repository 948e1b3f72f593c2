use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comercio_core::{DomainError, DomainResult, Money, ProductId, SupplierId};

/// Stock-keeping unit. Unique per product; uniqueness is enforced by the
/// store, format (trimmed, non-empty) is enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sku {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Sku::new(value)
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog product with its current on-hand stock count.
///
/// # Invariants
/// - `stock_quantity >= 0` after any committed workflow.
/// - `sku` is unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub sku: Sku,
    pub price: Money,
    pub stock_quantity: i64,
    pub min_stock: i64,
    pub supplier_id: Option<SupplierId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Low stock means on-hand has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }
}

/// Validated payload for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Sku,
    pub price: Money,
    pub stock_quantity: i64,
    pub min_stock: i64,
    pub supplier_id: Option<SupplierId>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if self.price.is_negative() {
            return Err(DomainError::validation("price must not be negative"));
        }
        if self.stock_quantity < 0 {
            return Err(DomainError::validation("stock_quantity must not be negative"));
        }
        if self.min_stock < 0 {
            return Err(DomainError::validation("min_stock must not be negative"));
        }
        Ok(())
    }

    /// Materialize a product, assigning identity and creation time.
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> DomainResult<Product> {
        self.validate()?;
        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            sku: self.sku,
            price: self.price,
            stock_quantity: self.stock_quantity,
            min_stock: self.min_stock,
            supplier_id: self.supplier_id,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, price_cents: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            sku: Sku::new("SKU-1").unwrap(),
            price: Money::from_cents(price_cents),
            stock_quantity: 5,
            min_stock: 2,
            supplier_id: None,
        }
    }

    #[test]
    fn sku_is_trimmed_and_non_empty() {
        assert_eq!(Sku::new("  ABC-1 ").unwrap().as_str(), "ABC-1");
        assert!(Sku::new("   ").is_err());
    }

    #[test]
    fn valid_product_materializes() {
        let product = new_product("Widget", 1000)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, Money::from_cents(1000));
    }

    #[test]
    fn negative_fields_are_rejected() {
        let mut negative_price = new_product("Widget", -1);
        assert!(negative_price.validate().is_err());
        negative_price.price = Money::from_cents(0);

        negative_price.stock_quantity = -1;
        assert!(negative_price.validate().is_err());
        negative_price.stock_quantity = 0;

        negative_price.min_stock = -1;
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        let product = new_product("  ", 100);
        match product.validate().unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("name")),
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn low_stock_compares_against_threshold() {
        let mut product = new_product("Widget", 100)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();

        product.stock_quantity = 3;
        product.min_stock = 2;
        assert!(!product.is_low_stock());

        product.stock_quantity = 2;
        assert!(product.is_low_stock());

        product.stock_quantity = 0;
        assert!(product.is_low_stock());
    }
}
