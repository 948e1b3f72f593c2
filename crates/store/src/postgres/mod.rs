//! PostgreSQL-backed store.
//!
//! Every workflow method runs inside one transaction: the product rows it
//! will touch are locked `SELECT ... FOR UPDATE` (in id order, so two
//! concurrent workflows over the same products cannot deadlock), the pure
//! pricing/costing functions run over that snapshot, and all writes commit
//! together. Dropping the transaction on any error rolls everything back.
//!
//! ## Error Mapping
//!
//! | PostgreSQL error code | Scenario                  | Mapped to            |
//! |-----------------------|---------------------------|----------------------|
//! | `23505` on products   | duplicate SKU             | `Conflict`           |
//! | `23505` on users      | duplicate username/email  | `Conflict`           |
//! | `23503` on products   | unknown supplier reference| `NotFound(supplier)` |
//! | `23503` on delete     | product still referenced  | `Conflict`           |
//! | anything else         | backend failure           | `Backend` (500)      |
//!
//! Queries are bound with typed parameters throughout; filters and
//! pagination arrive as [`crate::filter`] objects, never as SQL fragments.

mod parties;
mod products;
mod purchases;
mod sales;
mod users;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use comercio_auth::{PasswordHash, Role, User};
use comercio_core::{CustomerId, Money, ProductId, PurchaseId, SaleId, SupplierId, UserId};
use comercio_parties::{ContactInfo, Customer, Supplier};
use comercio_products::{Product, Sku};
use comercio_purchasing::{Purchase, PurchaseStatus};
use comercio_sales::Sale;

use crate::error::StoreError;

/// SQLx/PostgreSQL implementation of the [`crate::Store`] contract.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool sized for a single-process backend.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_err(
    column: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

pub(crate) fn decode_failure(err: sqlx::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

// -------------------------
// Row mappers
// -------------------------

pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        sku: Sku::new(row.try_get::<String, _>("sku")?).map_err(|e| decode_err("sku", e))?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock_quantity: row.try_get("stock_quantity")?,
        min_stock: row.try_get("min_stock")?,
        supplier_id: row
            .try_get::<Option<Uuid>, _>("supplier_id")?
            .map(SupplierId::from_uuid),
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn customer_from_row(row: &PgRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        contact: ContactInfo {
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
        },
        tax_id: row.try_get("tax_id")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn supplier_from_row(row: &PgRow) -> Result<Supplier, sqlx::Error> {
    Ok(Supplier {
        id: SupplierId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        contact: ContactInfo {
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
        },
        tax_id: row.try_get("tax_id")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: PasswordHash::from_stored(row.try_get("password_hash")?),
        role: row
            .try_get::<String, _>("role")?
            .parse::<Role>()
            .map_err(|e| decode_err("role", e))?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn sale_from_row(row: &PgRow) -> Result<Sale, sqlx::Error> {
    Ok(Sale {
        id: SaleId::from_uuid(row.try_get("id")?),
        customer_id: row
            .try_get::<Option<Uuid>, _>("customer_id")?
            .map(CustomerId::from_uuid),
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        payment_method: row.try_get("payment_method")?,
        created_by: UserId::from_uuid(row.try_get("created_by")?),
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn purchase_from_row(row: &PgRow) -> Result<Purchase, sqlx::Error> {
    Ok(Purchase {
        id: PurchaseId::from_uuid(row.try_get("id")?),
        supplier_id: row
            .try_get::<Option<Uuid>, _>("supplier_id")?
            .map(SupplierId::from_uuid),
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        status: row
            .try_get::<String, _>("status")?
            .parse::<PurchaseStatus>()
            .map_err(|e| decode_err("status", e))?,
        expected_delivery: row.try_get("expected_delivery")?,
        created_by: UserId::from_uuid(row.try_get("created_by")?),
        created_at: row.try_get("created_at")?,
    })
}
