use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use comercio_core::{DomainError, Money, PageRequest, Paginated, ProductId, PurchaseId};
use comercio_inventory::deduct;
use comercio_purchasing::{cost_purchase, Purchase, PurchaseStatus};

use crate::error::{StoreError, StoreResult};
use crate::filter::DateRange;
use crate::interface::{
    NewPurchase, PurchaseDetail, PurchaseItemDetail, PurchaseStore, PurchaseSummary,
};

use super::sales::write_stock_level;
use super::{decode_failure, product_from_row, purchase_from_row, PgStore};

const PURCHASE_COLUMNS: &str = "o.id, o.supplier_id, o.total_amount_cents, o.status, \
     o.expected_delivery, o.created_by, o.created_at, \
     s.name AS supplier_name, u.username AS created_by_name";

const PURCHASE_JOINS: &str = "FROM purchases o \
     LEFT JOIN suppliers s ON o.supplier_id = s.id \
     LEFT JOIN users u ON o.created_by = u.id";

fn summary_from_row(row: &sqlx::postgres::PgRow) -> Result<PurchaseSummary, sqlx::Error> {
    Ok(PurchaseSummary {
        purchase: purchase_from_row(row)?,
        supplier_name: row.try_get("supplier_name")?,
        created_by_name: row.try_get("created_by_name")?,
    })
}

#[async_trait]
impl PurchaseStore for PgStore {
    async fn create_purchase(&self, new: NewPurchase) -> StoreResult<Purchase> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StoreError::backend("begin", e))?;

        if let Some(supplier_id) = new.supplier_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE id = $1")
                .bind(supplier_id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| StoreError::backend("check_supplier", e))?;
            if exists == 0 {
                return Err(DomainError::not_found("supplier").into());
            }
        }

        // Existence check only; incoming stock is not constrained and, per the
        // inherited behavior, not incremented either (see DESIGN.md).
        let mut ids: Vec<Uuid> = new.items.iter().map(|i| Uuid::from(i.product_id)).collect();
        ids.sort_unstable();
        ids.dedup();
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, sku, price_cents, stock_quantity,
                   min_stock, supplier_id, created_at
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::backend("fetch_products", e))?;

        let mut products = HashMap::with_capacity(rows.len());
        for row in &rows {
            let product = product_from_row(row).map_err(decode_failure)?;
            products.insert(product.id, product);
        }

        let costed =
            cost_purchase(&new.items, |id| products.get(id)).map_err(DomainError::from)?;

        let purchase = Purchase {
            id: PurchaseId::new(),
            supplier_id: new.supplier_id,
            total_amount: costed.total_amount,
            status: PurchaseStatus::Pending,
            expected_delivery: new.expected_delivery,
            created_by: new.created_by,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO purchases (id, supplier_id, total_amount_cents, status,
                                   expected_delivery, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.supplier_id.map(Uuid::from))
        .bind(purchase.total_amount.cents())
        .bind(purchase.status.as_str())
        .bind(purchase.expected_delivery)
        .bind(purchase.created_by.as_uuid())
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::backend("insert_purchase", e))?;

        for line in &costed.lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (purchase_id, product_id, quantity,
                                            unit_price_cents, total_price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(purchase.id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.total_price.cents())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("insert_purchase_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::backend("commit", e))?;

        tracing::debug!(purchase_id = %purchase.id, total = %purchase.total_amount, "purchase committed");
        Ok(purchase)
    }

    async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<PurchaseDetail>> {
        let header = sqlx::query(&format!(
            "SELECT {PURCHASE_COLUMNS} {PURCHASE_JOINS} WHERE o.id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::backend("get_purchase", e))?;

        let Some(header) = header else {
            return Ok(None);
        };
        let summary = summary_from_row(&header).map_err(decode_failure)?;

        let item_rows = sqlx::query(
            r#"
            SELECT pi.product_id, p.name AS product_name, pi.quantity,
                   pi.unit_price_cents, pi.total_price_cents
            FROM purchase_items pi
            JOIN products p ON pi.product_id = p.id
            WHERE pi.purchase_id = $1
            ORDER BY pi.id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("get_purchase_items", e))?;

        let mut items = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            items.push(
                (|| -> Result<PurchaseItemDetail, sqlx::Error> {
                    Ok(PurchaseItemDetail {
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

        Ok(Some(PurchaseDetail { summary, items }))
    }

    async fn list_purchases(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> StoreResult<Paginated<PurchaseSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS} {PURCHASE_JOINS}
            WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
              AND ($2::timestamptz IS NULL OR o.created_at < $2)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(range.start_bound())
        .bind(range.end_bound())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::backend("list_purchases", e))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM purchases o
            WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
              AND ($2::timestamptz IS NULL OR o.created_at < $2)
            "#,
        )
        .bind(range.start_bound())
        .bind(range.end_bound())
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::backend("count_purchases", e))?;

        let items = rows
            .iter()
            .map(|row| summary_from_row(row).map_err(decode_failure))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Paginated::new(items, total.max(0) as u64, page))
    }

    async fn update_purchase_status(
        &self,
        id: PurchaseId,
        status: PurchaseStatus,
    ) -> StoreResult<Purchase> {
        let row = sqlx::query(
            r#"
            UPDATE purchases SET status = $1 WHERE id = $2
            RETURNING id, supplier_id, total_amount_cents, status,
                      expected_delivery, created_by, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::backend("update_purchase_status", e))?;

        match row {
            Some(row) => purchase_from_row(&row).map_err(decode_failure),
            None => Err(DomainError::not_found("purchase").into()),
        }
    }

    async fn cancel_purchase(&self, id: PurchaseId) -> StoreResult<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StoreError::backend("begin", e))?;

        let found = sqlx::query("SELECT id FROM purchases WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("lock_purchase", e))?;
        if found.is_none() {
            return Err(DomainError::not_found("purchase").into());
        }

        let item_rows = sqlx::query(
            "SELECT product_id, quantity FROM purchase_items WHERE purchase_id = $1 ORDER BY id",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::backend("get_purchase_items", e))?;

        let mut items: Vec<(ProductId, i64)> = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            let product_id: Uuid = row.try_get("product_id").map_err(decode_failure)?;
            let quantity: i64 = row.try_get("quantity").map_err(decode_failure)?;
            items.push((ProductId::from_uuid(product_id), quantity));
        }

        // Inverted direction relative to sales, inherited from the system
        // this one replaces; refuses to drive any level negative.
        let mut ids: Vec<Uuid> = items.iter().map(|(id, _)| Uuid::from(*id)).collect();
        ids.sort_unstable();
        ids.dedup();
        let rows = sqlx::query(
            "SELECT id, stock_quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::backend("lock_products", e))?;

        let mut levels: HashMap<ProductId, i64> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let product_id: Uuid = row.try_get("id").map_err(decode_failure)?;
            let stock: i64 = row.try_get("stock_quantity").map_err(decode_failure)?;
            levels.insert(ProductId::from_uuid(product_id), stock);
        }

        for (product_id, quantity) in &items {
            if let Some(level) = levels.get_mut(product_id) {
                *level = deduct(*level, *quantity).map_err(DomainError::from)?;
            }
        }
        for (product_id, level) in levels {
            write_stock_level(&mut tx, product_id, level).await?;
        }

        sqlx::query("DELETE FROM purchase_items WHERE purchase_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("delete_purchase_items", e))?;
        sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::backend("delete_purchase", e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::backend("commit", e))?;

        tracing::debug!(purchase_id = %id, "purchase cancelled");
        Ok(())
    }
}
