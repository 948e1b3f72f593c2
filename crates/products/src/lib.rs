//! `comercio-products` — product catalog domain types.

pub mod product;

pub use product::{NewProduct, Product, Sku};
