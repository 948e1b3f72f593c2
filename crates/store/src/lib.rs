//! `comercio-store` — persistence for the whole system.
//!
//! The [`Store`] trait is the unit-of-work boundary: every method is a single
//! atomic operation, including the multi-step sale/purchase workflows. Two
//! implementations share one semantics: [`MemoryStore`] (mutex-guarded, used
//! by tests and database-less dev runs) and [`PgStore`] (sqlx/PostgreSQL with
//! real transactions and row locking).

pub mod error;
pub mod filter;
pub mod interface;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use filter::{DateRange, Search};
pub use interface::{
    CustomerStore, NewPurchase, NewSale, ProductStore, ProductWithSupplier, PurchaseDetail,
    PurchaseItemDetail, PurchaseStore, PurchaseSummary, RegisterUser, SaleDetail, SaleItemDetail,
    SaleStore, SaleSummary, Store, SupplierStore, UserStore,
};
pub use memory::MemoryStore;
pub use postgres::PgStore;
