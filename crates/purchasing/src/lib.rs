//! `comercio-purchasing` — purchase entities and the costing half of the
//! purchase workflow.

pub mod costing;
pub mod purchase;

pub use costing::{cost_purchase, CostedLine, CostedPurchase, PurchaseError, PurchaseLineRequest};
pub use purchase::{Purchase, PurchaseItem, PurchaseStatus};
