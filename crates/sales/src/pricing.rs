//! Pure sale pricing: validate requested lines against the catalog, snapshot
//! unit prices, compute exact totals, and derive the stock decrements.
//!
//! This function never touches storage. The store runs it inside a unit of
//! work over freshly fetched products and persists its output atomically, so
//! every failure here aborts the whole sale with nothing written.

use std::collections::HashMap;

use thiserror::Error;

use comercio_core::{DomainError, Money, ProductId};
use comercio_inventory::{deduct, StockError};
use comercio_products::Product;

/// One requested line: which product, how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A priced line, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// Resulting on-hand level for one product, aggregated across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockUpdate {
    pub product_id: ProductId,
    pub new_stock: i64,
}

/// The fully validated outcome of pricing a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    pub total_amount: Money,
    /// One entry per distinct product, in first-seen order.
    pub stock_updates: Vec<StockUpdate>,
}

/// Why a sale was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaleError {
    #[error("sale requires at least one item")]
    EmptyItems,

    #[error("quantity must be positive for product {0}")]
    InvalidQuantity(ProductId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("insufficient stock for product {name}")]
    InsufficientStock { product_id: ProductId, name: String },

    #[error("sale total out of range")]
    AmountOverflow,
}

impl From<SaleError> for DomainError {
    fn from(err: SaleError) -> Self {
        match &err {
            SaleError::ProductNotFound(id) => DomainError::not_found(format!("product {id}")),
            SaleError::EmptyItems | SaleError::InsufficientStock { .. } => {
                DomainError::business_rule(err.to_string())
            }
            SaleError::InvalidQuantity(_) | SaleError::AmountOverflow => {
                DomainError::validation(err.to_string())
            }
        }
    }
}

/// Price a sale against current catalog state.
///
/// `product` resolves a product id to its freshly fetched state; returning
/// `None` aborts the whole sale with [`SaleError::ProductNotFound`].
///
/// The same product may appear on several lines; stock is tracked across
/// lines so the combined quantity is checked against what is actually on
/// hand.
pub fn price_sale<'a>(
    requests: &[SaleLineRequest],
    mut product: impl FnMut(&ProductId) -> Option<&'a Product>,
) -> Result<PricedSale, SaleError> {
    if requests.is_empty() {
        return Err(SaleError::EmptyItems);
    }

    let mut lines = Vec::with_capacity(requests.len());
    let mut stock_updates: Vec<StockUpdate> = Vec::new();
    // product id -> index into stock_updates
    let mut by_product: HashMap<ProductId, usize> = HashMap::new();
    let mut total_amount = Money::ZERO;

    for request in requests {
        let product = product(&request.product_id)
            .ok_or(SaleError::ProductNotFound(request.product_id))?;

        let slot = *by_product.entry(product.id).or_insert_with(|| {
            stock_updates.push(StockUpdate {
                product_id: product.id,
                new_stock: product.stock_quantity,
            });
            stock_updates.len() - 1
        });

        let remaining =
            deduct(stock_updates[slot].new_stock, request.quantity).map_err(|e| match e {
                StockError::NonPositiveQuantity => SaleError::InvalidQuantity(product.id),
                StockError::Shortfall { .. } => SaleError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                },
                StockError::Overflow => SaleError::AmountOverflow,
            })?;
        stock_updates[slot].new_stock = remaining;

        let total_price = product
            .price
            .checked_mul(request.quantity)
            .ok_or(SaleError::AmountOverflow)?;
        total_amount = total_amount
            .checked_add(total_price)
            .ok_or(SaleError::AmountOverflow)?;

        lines.push(PricedLine {
            product_id: product.id,
            quantity: request.quantity,
            unit_price: product.price,
            total_price,
        });
    }

    Ok(PricedSale {
        lines,
        total_amount,
        stock_updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use comercio_products::{NewProduct, Sku};
    use proptest::prelude::*;

    fn product(name: &str, price_cents: i64, stock: i64) -> Product {
        NewProduct {
            name: name.to_string(),
            description: None,
            sku: Sku::new(format!("SKU-{name}")).unwrap(),
            price: Money::from_cents(price_cents),
            stock_quantity: stock,
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
    fn prices_from_catalog_and_decrements_stock() {
        // stock 5 at 10.00, sell 3: total 30.00, stock drops to 2.
        let products = [product("A", 1000, 5)];
        let requests = [SaleLineRequest {
            product_id: products[0].id,
            quantity: 3,
        }];

        let priced = price_sale(&requests, lookup(&products)).unwrap();

        assert_eq!(priced.total_amount, Money::from_cents(3000));
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].unit_price, Money::from_cents(1000));
        assert_eq!(priced.lines[0].total_price, Money::from_cents(3000));
        assert_eq!(
            priced.stock_updates,
            vec![StockUpdate {
                product_id: products[0].id,
                new_stock: 2
            }]
        );
    }

    #[test]
    fn insufficient_stock_aborts_with_product_name() {
        // stock 2, request 5.
        let products = [product("B", 500, 2)];
        let requests = [SaleLineRequest {
            product_id: products[0].id,
            quantity: 5,
        }];

        match price_sale(&requests, lookup(&products)).unwrap_err() {
            SaleError::InsufficientStock { product_id, name } => {
                assert_eq!(product_id, products[0].id);
                assert_eq!(name, "B");
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn unknown_product_aborts_the_whole_sale() {
        let products = [product("A", 1000, 5)];
        let missing = ProductId::new();
        let requests = [
            SaleLineRequest {
                product_id: products[0].id,
                quantity: 1,
            },
            SaleLineRequest {
                product_id: missing,
                quantity: 1,
            },
        ];

        assert_eq!(
            price_sale(&requests, lookup(&products)).unwrap_err(),
            SaleError::ProductNotFound(missing)
        );
    }

    #[test]
    fn empty_request_is_rejected() {
        let products: [Product; 0] = [];
        assert_eq!(
            price_sale(&[], lookup(&products)).unwrap_err(),
            SaleError::EmptyItems
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let products = [product("A", 1000, 5)];
        let requests = [SaleLineRequest {
            product_id: products[0].id,
            quantity: 0,
        }];

        assert_eq!(
            price_sale(&requests, lookup(&products)).unwrap_err(),
            SaleError::InvalidQuantity(products[0].id)
        );
    }

    #[test]
    fn repeated_product_lines_draw_from_the_same_stock() {
        // Two lines of 3 against a stock of 5: the second must fail even
        // though each line alone would fit.
        let products = [product("A", 1000, 5)];
        let line = SaleLineRequest {
            product_id: products[0].id,
            quantity: 3,
        };

        match price_sale(&[line, line], lookup(&products)).unwrap_err() {
            SaleError::InsufficientStock { .. } => {}
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Two lines of 2 fit, and the stock update is aggregated.
        let line = SaleLineRequest {
            product_id: products[0].id,
            quantity: 2,
        };
        let priced = price_sale(&[line, line], lookup(&products)).unwrap();
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.stock_updates.len(), 1);
        assert_eq!(priced.stock_updates[0].new_stock, 1);
        assert_eq!(priced.total_amount, Money::from_cents(4000));
    }

    #[test]
    fn total_overflow_is_refused() {
        let products = [product("A", i64::MAX, 10)];
        let requests = [SaleLineRequest {
            product_id: products[0].id,
            quantity: 2,
        }];

        assert_eq!(
            price_sale(&requests, lookup(&products)).unwrap_err(),
            SaleError::AmountOverflow
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any accepted sale, total_amount is exactly the sum
        /// of quantity × catalog price per line, and every stock update is
        /// the old level minus the quantities sold of that product.
        #[test]
        fn totals_and_stock_updates_are_exact(
            entries in prop::collection::vec((1i64..10_000i64, 1i64..1_000i64, 1i64..50i64), 1..10)
        ) {
            // One product per entry: (price cents, stock headroom, quantity);
            // stock = quantity + headroom so the sale always fits.
            let products: Vec<Product> = entries
                .iter()
                .enumerate()
                .map(|(i, (price, headroom, quantity))| {
                    product(&format!("P{i}"), *price, quantity + headroom)
                })
                .collect();
            let requests: Vec<SaleLineRequest> = products
                .iter()
                .zip(entries.iter())
                .map(|(p, (_, _, quantity))| SaleLineRequest {
                    product_id: p.id,
                    quantity: *quantity,
                })
                .collect();

            let priced = price_sale(&requests, lookup(&products)).unwrap();

            let expected_total: i64 = entries
                .iter()
                .map(|(price, _, quantity)| price * quantity)
                .sum();
            prop_assert_eq!(priced.total_amount.cents(), expected_total);

            for (update, (p, (_, _, quantity))) in
                priced.stock_updates.iter().zip(products.iter().zip(entries.iter()))
            {
                prop_assert_eq!(update.product_id, p.id);
                prop_assert_eq!(update.new_stock, p.stock_quantity - quantity);
            }
        }
    }
}
