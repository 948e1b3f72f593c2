pub mod auth;
pub mod customers;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod suppliers;
pub mod system;
