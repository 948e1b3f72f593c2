//! Pure purchase costing: validate requested lines and compute exact totals
//! from caller-supplied prices.
//!
//! Purchases record the price actually paid, so unlike sales nothing is read
//! from the catalog beyond product existence, and no stock check applies to
//! incoming goods.

use thiserror::Error;

use comercio_core::{DomainError, Money, ProductId};
use comercio_products::Product;

/// One requested line: product, quantity and the price paid per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A costed line, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostedLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// The fully validated outcome of costing a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostedPurchase {
    pub lines: Vec<CostedLine>,
    pub total_amount: Money,
}

/// Why a purchase was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("purchase requires at least one item")]
    EmptyItems,

    #[error("quantity must be positive for product {0}")]
    InvalidQuantity(ProductId),

    #[error("unit price must not be negative for product {0}")]
    NegativeUnitPrice(ProductId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("purchase total out of range")]
    AmountOverflow,
}

impl From<PurchaseError> for DomainError {
    fn from(err: PurchaseError) -> Self {
        match &err {
            PurchaseError::ProductNotFound(id) => DomainError::not_found(format!("product {id}")),
            PurchaseError::EmptyItems => DomainError::business_rule(err.to_string()),
            PurchaseError::InvalidQuantity(_)
            | PurchaseError::NegativeUnitPrice(_)
            | PurchaseError::AmountOverflow => DomainError::validation(err.to_string()),
        }
    }
}

/// Cost a purchase. `product` resolves ids against fresh catalog state; it
/// is only consulted for existence.
pub fn cost_purchase<'a>(
    requests: &[PurchaseLineRequest],
    mut product: impl FnMut(&ProductId) -> Option<&'a Product>,
) -> Result<CostedPurchase, PurchaseError> {
    if requests.is_empty() {
        return Err(PurchaseError::EmptyItems);
    }

    let mut lines = Vec::with_capacity(requests.len());
    let mut total_amount = Money::ZERO;

    for request in requests {
        if product(&request.product_id).is_none() {
            return Err(PurchaseError::ProductNotFound(request.product_id));
        }
        if request.quantity <= 0 {
            return Err(PurchaseError::InvalidQuantity(request.product_id));
        }
        if request.unit_price.is_negative() {
            return Err(PurchaseError::NegativeUnitPrice(request.product_id));
        }

        let total_price = request
            .unit_price
            .checked_mul(request.quantity)
            .ok_or(PurchaseError::AmountOverflow)?;
        total_amount = total_amount
            .checked_add(total_price)
            .ok_or(PurchaseError::AmountOverflow)?;

        lines.push(CostedLine {
            product_id: request.product_id,
            quantity: request.quantity,
            unit_price: request.unit_price,
            total_price,
        });
    }

    Ok(CostedPurchase {
        lines,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use comercio_products::{NewProduct, Sku};
    use proptest::prelude::*;

    fn product(name: &str) -> Product {
        NewProduct {
            name: name.to_string(),
            description: None,
            sku: Sku::new(format!("SKU-{name}")).unwrap(),
            price: Money::from_cents(100),
            stock_quantity: 0,
            min_stock: 0,
            supplier_id: None,
        }
        .into_product(ProductId::new(), Utc::now())
        .unwrap()
    }

    fn lookup<'a>(products: &'a [Product]) -> impl FnMut(&ProductId) -> Option<&'a Product> + 'a {
        move |id| products.iter().find(|p| p.id == *id)
    }

    #[test]
    fn caller_prices_are_used_verbatim() {
        let products = [product("A")];
        let requests = [PurchaseLineRequest {
            product_id: products[0].id,
            quantity: 4,
            unit_price: Money::from_cents(250),
        }];

        let costed = cost_purchase(&requests, lookup(&products)).unwrap();
        assert_eq!(costed.total_amount, Money::from_cents(1000));
        assert_eq!(costed.lines[0].unit_price, Money::from_cents(250));
    }

    #[test]
    fn unknown_product_aborts() {
        let products = [product("A")];
        let missing = ProductId::new();
        let requests = [PurchaseLineRequest {
            product_id: missing,
            quantity: 1,
            unit_price: Money::from_cents(100),
        }];

        assert_eq!(
            cost_purchase(&requests, lookup(&products)).unwrap_err(),
            PurchaseError::ProductNotFound(missing)
        );
    }

    #[test]
    fn empty_and_invalid_lines_are_rejected() {
        let products = [product("A")];
        assert_eq!(
            cost_purchase(&[], lookup(&products)).unwrap_err(),
            PurchaseError::EmptyItems
        );

        let zero_quantity = [PurchaseLineRequest {
            product_id: products[0].id,
            quantity: 0,
            unit_price: Money::from_cents(100),
        }];
        assert_eq!(
            cost_purchase(&zero_quantity, lookup(&products)).unwrap_err(),
            PurchaseError::InvalidQuantity(products[0].id)
        );

        let negative_price = [PurchaseLineRequest {
            product_id: products[0].id,
            quantity: 1,
            unit_price: Money::from_cents(-1),
        }];
        assert_eq!(
            cost_purchase(&negative_price, lookup(&products)).unwrap_err(),
            PurchaseError::NegativeUnitPrice(products[0].id)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the committed total is exactly Σ quantity × unit price.
        #[test]
        fn total_is_sum_of_line_totals(
            entries in prop::collection::vec((0i64..10_000i64, 1i64..1_000i64), 1..10)
        ) {
            let products: Vec<Product> = (0..entries.len()).map(|i| product(&format!("P{i}"))).collect();
            let requests: Vec<PurchaseLineRequest> = products
                .iter()
                .zip(entries.iter())
                .map(|(p, (price, quantity))| PurchaseLineRequest {
                    product_id: p.id,
                    quantity: *quantity,
                    unit_price: Money::from_cents(*price),
                })
                .collect();

            let costed = cost_purchase(&requests, lookup(&products)).unwrap();
            let expected: i64 = entries.iter().map(|(price, quantity)| price * quantity).sum();
            prop_assert_eq!(costed.total_amount.cents(), expected);
        }
    }
}
