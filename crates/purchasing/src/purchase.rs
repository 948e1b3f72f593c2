use chrono::{DateTime, NaiveDate, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use comercio_core::{DomainError, Money, ProductId, PurchaseId, SupplierId, UserId};

/// Purchase lifecycle. A closed set: anything outside it is rejected at the
/// boundary rather than stored as a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "cancelled" => Ok(PurchaseStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "status must be one of pending, completed, cancelled (got {other:?})"
            ))),
        }
    }
}

/// A recorded purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub supplier_id: Option<SupplierId>,
    /// Derived: sum of the line totals.
    pub total_amount: Money,
    pub status: PurchaseStatus,
    pub expected_delivery: Option<NaiveDate>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// One line of a purchase. Unlike sales, `unit_price` is what the caller
/// actually paid, not the catalog price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub purchase_id: PurchaseId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_round_trips() {
        for status in [
            PurchaseStatus::Pending,
            PurchaseStatus::Completed,
            PurchaseStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<PurchaseStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_outside_the_closed_set_is_rejected() {
        match "shipped".parse::<PurchaseStatus>().unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("shipped")),
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn status_deserializes_from_lowercase_json() {
        let status: PurchaseStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, PurchaseStatus::Completed);
        assert!(serde_json::from_str::<PurchaseStatus>("\"SHIPPED\"").is_err());
    }
}
