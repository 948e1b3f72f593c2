//! Checked stock-level arithmetic.

use comercio_core::DomainError;
use thiserror::Error;

/// Why a stock movement was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StockError {
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("insufficient stock: {requested} requested, {on_hand} on hand")]
    Shortfall { on_hand: i64, requested: i64 },

    #[error("stock quantity out of range")]
    Overflow,
}

impl From<StockError> for DomainError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Shortfall { .. } => DomainError::business_rule(err.to_string()),
            StockError::NonPositiveQuantity | StockError::Overflow => {
                DomainError::validation(err.to_string())
            }
        }
    }
}

/// Remove `quantity` units from `on_hand`.
///
/// Refused outright if it would leave the level negative; callers decide
/// whether that is "insufficient stock for a sale" or "cancellation would
/// corrupt the count", but the invariant is enforced here either way.
pub fn deduct(on_hand: i64, quantity: i64) -> Result<i64, StockError> {
    if quantity <= 0 {
        return Err(StockError::NonPositiveQuantity);
    }
    let remaining = on_hand - quantity;
    if remaining < 0 {
        return Err(StockError::Shortfall {
            on_hand,
            requested: quantity,
        });
    }
    Ok(remaining)
}

/// Add `quantity` units back to `on_hand`.
pub fn restock(on_hand: i64, quantity: i64) -> Result<i64, StockError> {
    if quantity <= 0 {
        return Err(StockError::NonPositiveQuantity);
    }
    on_hand.checked_add(quantity).ok_or(StockError::Overflow)
}
