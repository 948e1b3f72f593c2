//! `comercio-sales` — sale entities and the pricing half of the sale
//! workflow (the store supplies atomicity, this crate supplies the rules).

pub mod pricing;
pub mod sale;

pub use pricing::{price_sale, PricedLine, PricedSale, SaleError, SaleLineRequest, StockUpdate};
pub use sale::{Sale, SaleItem, DEFAULT_PAYMENT_METHOD};
