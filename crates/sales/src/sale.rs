use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comercio_core::{CustomerId, Money, ProductId, SaleId, UserId};

/// Used when the caller does not name a payment method.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// A committed sale. Immutable once created; the only way out is
/// cancellation, which deletes it and reverses its stock effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub customer_id: Option<CustomerId>,
    /// Derived: sum of the line totals.
    pub total_amount: Money,
    pub payment_method: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// One line of a sale. `unit_price` is the catalog price snapshotted at
/// sale time, never caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}
