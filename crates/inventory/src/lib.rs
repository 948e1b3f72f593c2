//! `comercio-inventory` — stock-quantity bookkeeping.
//!
//! Every stock mutation in the system flows through this crate, so the
//! invariant "on-hand stock never goes negative" lives in exactly one place.

pub mod ledger;

pub use ledger::{deduct, restock, StockError};
