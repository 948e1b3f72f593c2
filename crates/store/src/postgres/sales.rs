use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use comercio_core::{DomainError, Money, PageRequest, Paginated, ProductId, SaleId};
use comercio_inventory::restock;
use comercio_products::Product;
use comercio_sales::{price_sale, Sale};

use crate::error::{StoreError, StoreResult};
use crate::filter::DateRange;
use crate::interface::{NewSale, SaleDetail, SaleItemDetail, SaleStore, SaleSummary};

use super::{decode_failure, product_from_row, sale_from_row, PgStore};

const SALE_COLUMNS: &str =
    "s.id, s.customer_id, s.total_amount_cents, s.payment_method, s.created_by, s.created_at, \
     c.name AS customer_name, u.username AS created_by_name";

const SALE_JOINS: &str = "FROM sales s \
     LEFT JOIN customers c ON s.customer_id = c.id \
     LEFT JOIN users u ON s.created_by = u.id";

fn summary_from_row(row: &sqlx::postgres::PgRow) -> Result<SaleSummary, sqlx::Error> {
    Ok(SaleSummary {
        sale: sale_from_row(row)?,
        customer_name: row.try_get("customer_name")?,
        created_by_name: row.try_get("created_by_name")?,
    })
}

/// Lock and fetch the named product rows inside `tx`, in id order so
/// concurrent workflows touching the same products cannot deadlock.
async fn lock_products(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_ids: impl Iterator<Item = ProductId>,
) -> StoreResult<HashMap<ProductId, Product>> {
    let mut ids: Vec<Uuid> = product_ids.map(Uuid::from).collect();
    ids.sort_unstable();
    ids.dedup();

    let rows = sqlx::query(
        r#"
        SELECT id, name, description, sku, price_cents, stock_quantity,
               min_stock, supplier_id, created_at
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| StoreError::backend("lock_products", e))?;

    let mut products = HashMap::with_capacity(rows.len());
    for row in &rows {
        let product = product_from_row(row).map_err(decode_failure)?;
        products.insert(product.id, product);
    }
    Ok(products)
}

pub(super) async fn write_stock_level(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    new_stock: i64,
) -> StoreResult<()> {
    sqlx::query("UPDATE products SET stock_quantity = $1 WHERE id = $2")
        .bind(new_stock)
        .bind(product_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::backend("write_stock_level", e))?;
    Ok(())
}

#[async_trait]
impl SaleStore for PgStore {
    async fn create_sale(&self, new: NewSale) -> StoreResult<Sale> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StoreError::backend("begin", e))?;

        if let Some(customer_id) = new.customer_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE id = $1")
                .bind(customer_id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| StoreError::backend("check_customer", e))?;
            if exists == 0 {
                return Err(DomainError::not_found("customer").into());
            }
        }

        let products = lock_products(&mut tx, new.items.iter().map(|i| i.product_id)).await?;
        let priced = price_sale(&new.items, |id| products.get(id)).map_err(DomainError::from)?;

        for update in &priced.stock_updates {
            write_stock_level(&mut tx, update.product_id, update.new_stock).await?;
        }

        let sale = Sale {
            id: SaleId::new(),
            customer_id: new.customer_id,
            total_amount: priced.total_amount,
            payment_method: new.payment_method,
            created_by: new.created_by,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, total_amount_cents, payment_method, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(sale.id.as_uuid())
        .bind(sale.customer_id.map(Uuid::from))
        .bind(sale.total_amount.cents())
        .bind(&sale.payment_method)
        .bind(sale.created_by.as_uuid())
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::backend("insert_sale", e))?;

        for line in &priced.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price_cents, total_price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(sale.id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.total_price.cents())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("insert_sale_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::backend("commit", e))?;

        tracing::debug!(sale_id = %sale.id, total = %sale.total_amount, "sale committed");
        Ok(sale)
    }

    async fn sale(&self, id: SaleId) -> StoreResult<Option<SaleDetail>> {
        let header = sqlx::query(&format!("SELECT {SALE_COLUMNS} {SALE_JOINS} WHERE s.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::backend("get_sale", e))?;

        let Some(header) = header else {
            return Ok(None);
        };
        let summary = summary_from_row(&header).map_err(decode_failure)?;

        let item_rows = sqlx::query(
            r#"
            SELECT si.product_id, p.name AS product_name, si.quantity,
                   si.unit_price_cents, si.total_price_cents
            FROM sale_items si
            JOIN products p ON si.product_id = p.id
            WHERE si.sale_id = $1
            ORDER BY si.id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("get_sale_items", e))?;

        let mut items = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            items.push(
                (|| -> Result<SaleItemDetail, sqlx::Error> {
                    Ok(SaleItemDetail {
                        product_id: ProductId::from_uuid(row.try_get("product_id")?),
                        product_name: row.try_get("product_name")?,
                        quantity: row.try_get("quantity")?,
                        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                        total_price: Money::from_cents(row.try_get("total_price_cents")?),
                    })
                })()
                .map_err(decode_failure)?,
            );
        }

        Ok(Some(SaleDetail { summary, items }))
    }

    async fn list_sales(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> StoreResult<Paginated<SaleSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SALE_COLUMNS} {SALE_JOINS}
            WHERE ($1::timestamptz IS NULL OR s.created_at >= $1)
              AND ($2::timestamptz IS NULL OR s.created_at < $2)
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(range.start_bound())
        .bind(range.end_bound())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("list_sales", e))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM sales s
            WHERE ($1::timestamptz IS NULL OR s.created_at >= $1)
              AND ($2::timestamptz IS NULL OR s.created_at < $2)
            "#,
        )
        .bind(range.start_bound())
        .bind(range.end_bound())
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::backend("count_sales", e))?;

        let items = rows
            .iter()
            .map(|row| summary_from_row(row).map_err(decode_failure))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Paginated::new(items, total.max(0) as u64, page))
    }

    async fn cancel_sale(&self, id: SaleId) -> StoreResult<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StoreError::backend("begin", e))?;

        let found = sqlx::query("SELECT id FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("lock_sale", e))?;
        if found.is_none() {
            return Err(DomainError::not_found("sale").into());
        }

        let item_rows =
            sqlx::query("SELECT product_id, quantity FROM sale_items WHERE sale_id = $1 ORDER BY id")
                .bind(id.as_uuid())
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| StoreError::backend("get_sale_items", e))?;

        let mut items: Vec<(ProductId, i64)> = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            let product_id: Uuid = row.try_get("product_id").map_err(decode_failure)?;
            let quantity: i64 = row.try_get("quantity").map_err(decode_failure)?;
            items.push((ProductId::from_uuid(product_id), quantity));
        }

        let products = lock_products(&mut tx, items.iter().map(|(id, _)| *id)).await?;
        let mut levels: HashMap<ProductId, i64> = products
            .iter()
            .map(|(id, p)| (*id, p.stock_quantity))
            .collect();

        // Reverse the original decrement per item before anything is deleted.
        for (product_id, quantity) in &items {
            if let Some(level) = levels.get_mut(product_id) {
                *level = restock(*level, *quantity).map_err(DomainError::from)?;
            }
        }
        for (product_id, level) in levels {
            write_stock_level(&mut tx, product_id, level).await?;
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("delete_sale_items", e))?;
        sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("delete_sale", e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::backend("commit", e))?;

        tracing::debug!(sale_id = %id, "sale cancelled");
        Ok(())
    }
}
