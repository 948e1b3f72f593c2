use async_trait::async_trait;
use chrono::Utc;

use comercio_core::{CustomerId, DomainError, PageRequest, Paginated, SupplierId};
use comercio_parties::{Customer, NewCustomer, NewSupplier, Supplier};

use crate::error::{StoreError, StoreResult};
use crate::filter::Search;
use crate::interface::{CustomerStore, SupplierStore};

use super::{customer_from_row, decode_failure, supplier_from_row, PgStore};

#[async_trait]
impl CustomerStore for PgStore {
    async fn create_customer(&self, new: NewCustomer) -> StoreResult<Customer> {
        let customer = new.into_customer(CustomerId::new(), Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, tax_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.contact.email)
        .bind(&customer.contact.phone)
        .bind(&customer.contact.address)
        .bind(&customer.tax_id)
        .bind(customer.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::backend("create_customer", e))?;

        Ok(customer)
    }

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::backend("get_customer", e))?;

        row.map(|row| customer_from_row(&row).map_err(decode_failure))
            .transpose()
    }

    async fn list_customers(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<Customer>> {
        let pattern = search.like_pattern();

        let rows = sqlx::query(
            r#"
            SELECT * FROM customers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("list_customers", e))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::backend("count_customers", e))?;

        let items = rows
            .iter()
            .map(|row| customer_from_row(row).map_err(decode_failure))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Paginated::new(items, total.max(0) as u64, page))
    }

    async fn update_customer(&self, id: CustomerId, new: NewCustomer) -> StoreResult<Customer> {
        new.validate()?;

        let row = sqlx::query(
            r#"
            UPDATE customers SET name = $1, email = $2, phone = $3, address = $4, tax_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.contact.email)
        .bind(&new.contact.phone)
        .bind(&new.contact.address)
        .bind(&new.tax_id)
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::backend("update_customer", e))?;

        match row {
            Some(row) => customer_from_row(&row).map_err(decode_failure),
            None => Err(DomainError::not_found("customer").into()),
        }
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        // Sales detach via ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::backend("delete_customer", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("customer").into());
        }
        Ok(())
    }
}

#[async_trait]
impl SupplierStore for PgStore {
    async fn create_supplier(&self, new: NewSupplier) -> StoreResult<Supplier> {
        let supplier = new.into_supplier(SupplierId::new(), Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, email, phone, address, tax_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(&supplier.contact.email)
        .bind(&supplier.contact.phone)
        .bind(&supplier.contact.address)
        .bind(&supplier.tax_id)
        .bind(supplier.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::backend("create_supplier", e))?;

        Ok(supplier)
    }

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query("SELECT * FROM suppliers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::backend("get_supplier", e))?;

        row.map(|row| supplier_from_row(&row).map_err(decode_failure))
            .transpose()
    }

    async fn list_suppliers(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<Supplier>> {
        let pattern = search.like_pattern();

        let rows = sqlx::query(
            r#"
            SELECT * FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("list_suppliers", e))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::backend("count_suppliers", e))?;

        let items = rows
            .iter()
            .map(|row| supplier_from_row(row).map_err(decode_failure))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Paginated::new(items, total.max(0) as u64, page))
    }

    async fn update_supplier(&self, id: SupplierId, new: NewSupplier) -> StoreResult<Supplier> {
        new.validate()?;

        let row = sqlx::query(
            r#"
            UPDATE suppliers SET name = $1, email = $2, phone = $3, address = $4, tax_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.contact.email)
        .bind(&new.contact.phone)
        .bind(&new.contact.address)
        .bind(&new.tax_id)
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::backend("update_supplier", e))?;

        match row {
            Some(row) => supplier_from_row(&row).map_err(decode_failure),
            None => Err(DomainError::not_found("supplier").into()),
        }
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<()> {
        // Products and purchases detach via ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::backend("delete_supplier", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("supplier").into());
        }
        Ok(())
    }
}
