//! `comercio-parties` — the people and companies this business trades with.

pub mod contact;
pub mod customer;
pub mod supplier;

pub use contact::ContactInfo;
pub use customer::{Customer, NewCustomer};
pub use supplier::{NewSupplier, Supplier};
