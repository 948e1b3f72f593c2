use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use comercio_core::{DomainError, PageRequest, Paginated, ProductId};
use comercio_products::{NewProduct, Product};

use crate::error::{is_foreign_key_violation, is_unique_violation, StoreError, StoreResult};
use crate::filter::Search;
use crate::interface::{ProductStore, ProductWithSupplier};

use super::{decode_failure, product_from_row, PgStore};

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.description, p.sku, p.price_cents, p.stock_quantity, p.min_stock, \
     p.supplier_id, p.created_at";

fn map_write_error(operation: &'static str, e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        DomainError::conflict("sku already exists").into()
    } else if is_foreign_key_violation(&e) {
        DomainError::not_found("supplier").into()
    } else {
        StoreError::backend(operation, e)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let product = new.into_product(ProductId::new(), Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, sku, price_cents,
                stock_quantity, min_stock, supplier_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.sku.as_str())
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.min_stock)
        .bind(product.supplier_id.map(Uuid::from))
        .bind(product.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_write_error("create_product", e))?;

        Ok(product)
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductWithSupplier>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, s.name AS supplier_name
            FROM products p
            LEFT JOIN suppliers s ON p.supplier_id = s.id
            WHERE p.id = $1
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::backend("get_product", e))?;

        row.map(|row| {
            Ok(ProductWithSupplier {
                product: product_from_row(&row).map_err(decode_failure)?,
                supplier_name: row.try_get("supplier_name").map_err(decode_failure)?,
            })
        })
        .transpose()
    }

    async fn list_products(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<ProductWithSupplier>> {
        let pattern = search.like_pattern();

        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, s.name AS supplier_name
            FROM products p
            LEFT JOIN suppliers s ON p.supplier_id = s.id
            WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.sku ILIKE $1)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("list_products", e))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::text IS NULL OR name ILIKE $1 OR sku ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::backend("count_products", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(ProductWithSupplier {
                product: product_from_row(row).map_err(decode_failure)?,
                supplier_name: row.try_get("supplier_name").map_err(decode_failure)?,
            });
        }
        Ok(Paginated::new(items, total.max(0) as u64, page))
    }

    async fn low_stock_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.stock_quantity <= p.min_stock
            ORDER BY p.stock_quantity ASC, p.id ASC
            "#
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("low_stock_products", e))?;

        rows.iter()
            .map(|row| product_from_row(row).map_err(decode_failure))
            .collect()
    }

    async fn update_product(&self, id: ProductId, new: NewProduct) -> StoreResult<Product> {
        new.validate()?;

        let row = sqlx::query(
            r#"
            UPDATE products SET
                name = $1, description = $2, sku = $3, price_cents = $4,
                stock_quantity = $5, min_stock = $6, supplier_id = $7
            WHERE id = $8
            RETURNING id, name, description, sku, price_cents,
                      stock_quantity, min_stock, supplier_id, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.sku.as_str())
        .bind(new.price.cents())
        .bind(new.stock_quantity)
        .bind(new.min_stock)
        .bind(new.supplier_id.map(Uuid::from))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_write_error("update_product", e))?;

        match row {
            Some(row) => product_from_row(&row).map_err(decode_failure),
            None => Err(DomainError::not_found("product").into()),
        }
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DomainError::conflict("product is referenced by recorded transactions").into()
                } else {
                    StoreError::backend("delete_product", e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("product").into());
        }
        Ok(())
    }
}
