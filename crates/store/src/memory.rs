//! In-memory store.
//!
//! One mutex around the whole state makes every operation a unit of work:
//! workflows validate first and mutate only after every check has passed, so
//! a failure can never leave partial state behind. Used by the test suite
//! and by dev runs without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use comercio_auth::User;
use comercio_core::{
    CustomerId, DomainError, PageRequest, Paginated, ProductId, PurchaseId, SaleId, SupplierId,
    UserId,
};
use comercio_inventory::{deduct, restock};
use comercio_parties::{Customer, NewCustomer, NewSupplier, Supplier};
use comercio_products::{NewProduct, Product};
use comercio_purchasing::{cost_purchase, Purchase, PurchaseItem, PurchaseStatus};
use comercio_sales::{price_sale, Sale, SaleItem};

use crate::error::StoreResult;
use crate::filter::{DateRange, Search};
use crate::interface::{
    CustomerStore, NewPurchase, NewSale, ProductStore, ProductWithSupplier, PurchaseDetail,
    PurchaseItemDetail, PurchaseStore, PurchaseSummary, RegisterUser, SaleDetail, SaleItemDetail,
    SaleStore, SaleSummary, SupplierStore, UserStore,
};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    customers: HashMap<CustomerId, Customer>,
    suppliers: HashMap<SupplierId, Supplier>,
    sales: HashMap<SaleId, (Sale, Vec<SaleItem>)>,
    purchases: HashMap<PurchaseId, (Purchase, Vec<PurchaseItem>)>,
}

/// Mutex-guarded store; semantics match [`crate::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> Paginated<T> {
    let total = items.len() as u64;
    let start = usize::try_from(page.offset())
        .unwrap_or(usize::MAX)
        .min(items.len());
    let end = start
        .saturating_add(page.limit() as usize)
        .min(items.len());
    let page_items = items.drain(start..end).collect();
    Paginated::new(page_items, total, page)
}

fn ensure_unique_sku(inner: &Inner, sku: &str, exclude: Option<ProductId>) -> StoreResult<()> {
    let taken = inner
        .products
        .values()
        .any(|p| p.sku.as_str() == sku && Some(p.id) != exclude);
    if taken {
        return Err(DomainError::conflict("sku already exists").into());
    }
    Ok(())
}

impl Inner {
    fn ensure_customer(&self, id: CustomerId) -> StoreResult<()> {
        if self.customers.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::not_found("customer").into())
        }
    }

    fn ensure_supplier(&self, id: SupplierId) -> StoreResult<()> {
        if self.suppliers.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::not_found("supplier").into())
        }
    }

    fn sale_summary(&self, sale: &Sale) -> SaleSummary {
        SaleSummary {
            sale: sale.clone(),
            customer_name: sale
                .customer_id
                .and_then(|id| self.customers.get(&id))
                .map(|c| c.name.clone()),
            created_by_name: self.users.get(&sale.created_by).map(|u| u.username.clone()),
        }
    }

    fn purchase_summary(&self, purchase: &Purchase) -> PurchaseSummary {
        PurchaseSummary {
            purchase: purchase.clone(),
            supplier_name: purchase
                .supplier_id
                .and_then(|id| self.suppliers.get(&id))
                .map(|s| s.name.clone()),
            created_by_name: self
                .users
                .get(&purchase.created_by)
                .map(|u| u.username.clone()),
        }
    }

    fn product_name(&self, id: ProductId) -> String {
        self.products
            .get(&id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut inner = self.lock();
        ensure_unique_sku(&inner, new.sku.as_str(), None)?;
        if let Some(supplier_id) = new.supplier_id {
            inner.ensure_supplier(supplier_id)?;
        }
        let product = new.into_product(ProductId::new(), Utc::now())?;
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductWithSupplier>> {
        let inner = self.lock();
        Ok(inner.products.get(&id).map(|product| ProductWithSupplier {
            product: product.clone(),
            supplier_name: product
                .supplier_id
                .and_then(|sid| inner.suppliers.get(&sid))
                .map(|s| s.name.clone()),
        }))
    }

    async fn list_products(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<ProductWithSupplier>> {
        let inner = self.lock();
        let mut matches: Vec<&Product> = inner
            .products
            .values()
            .filter(|p| search.matches([Some(p.name.as_str()), Some(p.sku.as_str())]))
            .collect();
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });

        let rows: Vec<ProductWithSupplier> = matches
            .into_iter()
            .map(|product| ProductWithSupplier {
                product: product.clone(),
                supplier_name: product
                    .supplier_id
                    .and_then(|sid| inner.suppliers.get(&sid))
                    .map(|s| s.name.clone()),
            })
            .collect();
        Ok(paginate(rows, page))
    }

    async fn low_stock_products(&self) -> StoreResult<Vec<Product>> {
        let inner = self.lock();
        let mut low: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect();
        low.sort_by(|a, b| {
            a.stock_quantity
                .cmp(&b.stock_quantity)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(low)
    }

    async fn update_product(&self, id: ProductId, new: NewProduct) -> StoreResult<Product> {
        let mut inner = self.lock();
        let created_at = match inner.products.get(&id) {
            Some(existing) => existing.created_at,
            None => return Err(DomainError::not_found("product").into()),
        };
        ensure_unique_sku(&inner, new.sku.as_str(), Some(id))?;
        if let Some(supplier_id) = new.supplier_id {
            inner.ensure_supplier(supplier_id)?;
        }
        let product = new.into_product(id, created_at)?;
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut inner = self.lock();
        if !inner.products.contains_key(&id) {
            return Err(DomainError::not_found("product").into());
        }
        let referenced = inner
            .sales
            .values()
            .any(|(_, items)| items.iter().any(|i| i.product_id == id))
            || inner
                .purchases
                .values()
                .any(|(_, items)| items.iter().any(|i| i.product_id == id));
        if referenced {
            return Err(
                DomainError::conflict("product is referenced by recorded transactions").into(),
            );
        }
        inner.products.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn create_customer(&self, new: NewCustomer) -> StoreResult<Customer> {
        let mut inner = self.lock();
        let customer = new.into_customer(CustomerId::new(), Utc::now())?;
        inner.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.lock().customers.get(&id).cloned())
    }

    async fn list_customers(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<Customer>> {
        let inner = self.lock();
        let mut matches: Vec<Customer> = inner
            .customers
            .values()
            .filter(|c| {
                search.matches([
                    Some(c.name.as_str()),
                    c.contact.email.as_deref(),
                    c.contact.phone.as_deref(),
                ])
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(paginate(matches, page))
    }

    async fn update_customer(&self, id: CustomerId, new: NewCustomer) -> StoreResult<Customer> {
        let mut inner = self.lock();
        let created_at = match inner.customers.get(&id) {
            Some(existing) => existing.created_at,
            None => return Err(DomainError::not_found("customer").into()),
        };
        let customer = new.into_customer(id, created_at)?;
        inner.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.customers.remove(&id).is_none() {
            return Err(DomainError::not_found("customer").into());
        }
        // ON DELETE SET NULL semantics: historical sales keep a null reference.
        for (sale, _) in inner.sales.values_mut() {
            if sale.customer_id == Some(id) {
                sale.customer_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SupplierStore for MemoryStore {
    async fn create_supplier(&self, new: NewSupplier) -> StoreResult<Supplier> {
        let mut inner = self.lock();
        let supplier = new.into_supplier(SupplierId::new(), Utc::now())?;
        inner.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(self.lock().suppliers.get(&id).cloned())
    }

    async fn list_suppliers(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<Supplier>> {
        let inner = self.lock();
        let mut matches: Vec<Supplier> = inner
            .suppliers
            .values()
            .filter(|s| {
                search.matches([
                    Some(s.name.as_str()),
                    s.contact.email.as_deref(),
                    s.contact.phone.as_deref(),
                ])
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(paginate(matches, page))
    }

    async fn update_supplier(&self, id: SupplierId, new: NewSupplier) -> StoreResult<Supplier> {
        let mut inner = self.lock();
        let created_at = match inner.suppliers.get(&id) {
            Some(existing) => existing.created_at,
            None => return Err(DomainError::not_found("supplier").into()),
        };
        let supplier = new.into_supplier(id, created_at)?;
        inner.suppliers.insert(id, supplier.clone());
        Ok(supplier)
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.suppliers.remove(&id).is_none() {
            return Err(DomainError::not_found("supplier").into());
        }
        for product in inner.products.values_mut() {
            if product.supplier_id == Some(id) {
                product.supplier_id = None;
            }
        }
        for (purchase, _) in inner.purchases.values_mut() {
            if purchase.supplier_id == Some(id) {
                purchase.supplier_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn create_sale(&self, new: NewSale) -> StoreResult<Sale> {
        let mut inner = self.lock();
        if let Some(customer_id) = new.customer_id {
            inner.ensure_customer(customer_id)?;
        }

        let priced =
            price_sale(&new.items, |id| inner.products.get(id)).map_err(DomainError::from)?;

        for update in &priced.stock_updates {
            if let Some(product) = inner.products.get_mut(&update.product_id) {
                product.stock_quantity = update.new_stock;
            }
        }

        let sale = Sale {
            id: SaleId::new(),
            customer_id: new.customer_id,
            total_amount: priced.total_amount,
            payment_method: new.payment_method,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        let items: Vec<SaleItem> = priced
            .lines
            .iter()
            .map(|line| SaleItem {
                sale_id: sale.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price: line.total_price,
            })
            .collect();

        tracing::debug!(sale_id = %sale.id, total = %sale.total_amount, "sale committed");
        inner.sales.insert(sale.id, (sale.clone(), items));
        Ok(sale)
    }

    async fn sale(&self, id: SaleId) -> StoreResult<Option<SaleDetail>> {
        let inner = self.lock();
        Ok(inner.sales.get(&id).map(|(sale, items)| SaleDetail {
            summary: inner.sale_summary(sale),
            items: items
                .iter()
                .map(|item| SaleItemDetail {
                    product_id: item.product_id,
                    product_name: inner.product_name(item.product_id),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
        }))
    }

    async fn list_sales(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> StoreResult<Paginated<SaleSummary>> {
        let inner = self.lock();
        let mut matches: Vec<SaleSummary> = inner
            .sales
            .values()
            .filter(|(sale, _)| range.contains(sale.created_at))
            .map(|(sale, _)| inner.sale_summary(sale))
            .collect();
        matches.sort_by(|a, b| {
            b.sale
                .created_at
                .cmp(&a.sale.created_at)
                .then_with(|| b.sale.id.as_uuid().cmp(a.sale.id.as_uuid()))
        });
        Ok(paginate(matches, page))
    }

    async fn cancel_sale(&self, id: SaleId) -> StoreResult<()> {
        let mut inner = self.lock();
        let items = match inner.sales.get(&id) {
            Some((_, items)) => items.clone(),
            None => return Err(DomainError::not_found("sale").into()),
        };

        // Two phases: compute every restocked level, then apply, so an error
        // cannot leave a half-reversed sale behind.
        let mut levels: HashMap<ProductId, i64> = HashMap::new();
        for item in &items {
            if let Some(product) = inner.products.get(&item.product_id) {
                let level = levels
                    .entry(item.product_id)
                    .or_insert(product.stock_quantity);
                *level = restock(*level, item.quantity).map_err(DomainError::from)?;
            }
        }

        for (product_id, level) in levels {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.stock_quantity = level;
            }
        }
        inner.sales.remove(&id);
        tracing::debug!(sale_id = %id, "sale cancelled");
        Ok(())
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn create_purchase(&self, new: NewPurchase) -> StoreResult<Purchase> {
        let mut inner = self.lock();
        if let Some(supplier_id) = new.supplier_id {
            inner.ensure_supplier(supplier_id)?;
        }

        let costed =
            cost_purchase(&new.items, |id| inner.products.get(id)).map_err(DomainError::from)?;

        let purchase = Purchase {
            id: PurchaseId::new(),
            supplier_id: new.supplier_id,
            total_amount: costed.total_amount,
            status: PurchaseStatus::Pending,
            expected_delivery: new.expected_delivery,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        let items: Vec<PurchaseItem> = costed
            .lines
            .iter()
            .map(|line| PurchaseItem {
                purchase_id: purchase.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price: line.total_price,
            })
            .collect();

        tracing::debug!(purchase_id = %purchase.id, total = %purchase.total_amount, "purchase committed");
        inner.purchases.insert(purchase.id, (purchase.clone(), items));
        Ok(purchase)
    }

    async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<PurchaseDetail>> {
        let inner = self.lock();
        Ok(inner.purchases.get(&id).map(|(purchase, items)| PurchaseDetail {
            summary: inner.purchase_summary(purchase),
            items: items
                .iter()
                .map(|item| PurchaseItemDetail {
                    product_id: item.product_id,
                    product_name: inner.product_name(item.product_id),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
        }))
    }

    async fn list_purchases(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> StoreResult<Paginated<PurchaseSummary>> {
        let inner = self.lock();
        let mut matches: Vec<PurchaseSummary> = inner
            .purchases
            .values()
            .filter(|(purchase, _)| range.contains(purchase.created_at))
            .map(|(purchase, _)| inner.purchase_summary(purchase))
            .collect();
        matches.sort_by(|a, b| {
            b.purchase
                .created_at
                .cmp(&a.purchase.created_at)
                .then_with(|| b.purchase.id.as_uuid().cmp(a.purchase.id.as_uuid()))
        });
        Ok(paginate(matches, page))
    }

    async fn update_purchase_status(
        &self,
        id: PurchaseId,
        status: PurchaseStatus,
    ) -> StoreResult<Purchase> {
        let mut inner = self.lock();
        match inner.purchases.get_mut(&id) {
            Some((purchase, _)) => {
                purchase.status = status;
                Ok(purchase.clone())
            }
            None => Err(DomainError::not_found("purchase").into()),
        }
    }

    async fn cancel_purchase(&self, id: PurchaseId) -> StoreResult<()> {
        let mut inner = self.lock();
        let items = match inner.purchases.get(&id) {
            Some((_, items)) => items.clone(),
            None => return Err(DomainError::not_found("purchase").into()),
        };

        // Inverse of the (never performed) create-side increment; refuses to
        // drive any stock level negative. Two phases, as in cancel_sale.
        let mut levels: HashMap<ProductId, i64> = HashMap::new();
        for item in &items {
            if let Some(product) = inner.products.get(&item.product_id) {
                let level = levels
                    .entry(item.product_id)
                    .or_insert(product.stock_quantity);
                *level = deduct(*level, item.quantity).map_err(DomainError::from)?;
            }
        }

        for (product_id, level) in levels {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.stock_quantity = level;
            }
        }
        inner.purchases.remove(&id);
        tracing::debug!(purchase_id = %id, "purchase cancelled");
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new: RegisterUser) -> StoreResult<User> {
        let mut inner = self.lock();
        let taken = inner
            .users
            .values()
            .any(|u| u.username == new.username || u.email == new.email);
        if taken {
            return Err(DomainError::conflict("user or email already exists").into());
        }

        let user = User {
            id: UserId::new(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.lock();
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use comercio_auth::{PasswordHash, Role};
    use comercio_core::Money;
    use comercio_products::Sku;
    use comercio_purchasing::PurchaseLineRequest;
    use comercio_sales::SaleLineRequest;

    fn new_product(name: &str, sku: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            sku: Sku::new(sku).unwrap(),
            price: Money::from_cents(price_cents),
            stock_quantity: stock,
            min_stock: 0,
            supplier_id: None,
        }
    }

    async fn seed_user(store: &MemoryStore) -> User {
        store
            .create_user(RegisterUser {
                username: "operator".to_string(),
                email: "operator@example.com".to_string(),
                password_hash: PasswordHash::from_stored("x".to_string()),
                role: Role::User,
            })
            .await
            .unwrap()
    }

    async fn stock_of(store: &MemoryStore, id: ProductId) -> i64 {
        store
            .product(id)
            .await
            .unwrap()
            .unwrap()
            .product
            .stock_quantity
    }

    fn domain(err: StoreError) -> DomainError {
        match err {
            StoreError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sale_lifecycle_decrements_then_restores_stock() {
        // Stock 5 at 10.00, sell 3, then cancel.
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 5))
            .await
            .unwrap();

        let sale = store
            .create_sale(NewSale {
                customer_id: None,
                items: vec![SaleLineRequest {
                    product_id: product.id,
                    quantity: 3,
                }],
                payment_method: "cash".to_string(),
                created_by: user.id,
            })
            .await
            .unwrap();

        assert_eq!(sale.total_amount, Money::from_cents(3000));
        assert_eq!(stock_of(&store, product.id).await, 2);

        let detail = store.sale(sale.id).await.unwrap().unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].unit_price, Money::from_cents(1000));
        assert_eq!(detail.items[0].product_name, "A");
        assert_eq!(detail.summary.created_by_name.as_deref(), Some("operator"));

        store.cancel_sale(sale.id).await.unwrap();
        assert_eq!(stock_of(&store, product.id).await, 5);
        assert!(store.sale(sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelling_a_missing_sale_is_not_found() {
        let store = MemoryStore::new();
        match domain(store.cancel_sale(SaleId::new()).await.unwrap_err()) {
            DomainError::NotFound(what) => assert_eq!(what, "sale"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_no_trace() {
        // Stock 2, request 5.
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("B", "SKU-B", 500, 2))
            .await
            .unwrap();

        let err = store
            .create_sale(NewSale {
                customer_id: None,
                items: vec![SaleLineRequest {
                    product_id: product.id,
                    quantity: 5,
                }],
                payment_method: "cash".to_string(),
                created_by: user.id,
            })
            .await
            .unwrap_err();

        match domain(err) {
            DomainError::BusinessRule(msg) => assert!(msg.contains("B"), "message: {msg}"),
            other => panic!("expected BusinessRule, got {other:?}"),
        }
        assert_eq!(stock_of(&store, product.id).await, 2);
        let sales = store
            .list_sales(DateRange::all(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(sales.total, 0);
    }

    #[tokio::test]
    async fn failed_multi_line_sale_rolls_back_every_product() {
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let a = store
            .create_product(new_product("A", "SKU-A", 1000, 5))
            .await
            .unwrap();
        let b = store
            .create_product(new_product("B", "SKU-B", 500, 1))
            .await
            .unwrap();

        let err = store
            .create_sale(NewSale {
                customer_id: None,
                items: vec![
                    SaleLineRequest {
                        product_id: a.id,
                        quantity: 3,
                    },
                    SaleLineRequest {
                        product_id: b.id,
                        quantity: 5,
                    },
                ],
                payment_method: "cash".to_string(),
                created_by: user.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(domain(err), DomainError::BusinessRule(_)));
        assert_eq!(stock_of(&store, a.id).await, 5);
        assert_eq!(stock_of(&store, b.id).await, 1);
    }

    #[tokio::test]
    async fn sale_with_unknown_customer_is_not_found() {
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 5))
            .await
            .unwrap();

        let err = store
            .create_sale(NewSale {
                customer_id: Some(CustomerId::new()),
                items: vec![SaleLineRequest {
                    product_id: product.id,
                    quantity: 1,
                }],
                payment_method: "cash".to_string(),
                created_by: user.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(domain(err), DomainError::NotFound(_)));
        assert_eq!(stock_of(&store, product.id).await, 5);
    }

    #[tokio::test]
    async fn duplicate_sku_conflicts_and_inserts_nothing() {
        let store = MemoryStore::new();
        store
            .create_product(new_product("A", "SKU-A", 1000, 5))
            .await
            .unwrap();

        let err = store
            .create_product(new_product("A again", "SKU-A", 900, 1))
            .await
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::Conflict(_)));

        let products = store
            .list_products(Search::any(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(products.total, 1);
    }

    #[tokio::test]
    async fn purchase_creation_does_not_touch_stock_but_cancel_deducts() {
        // Inherited asymmetry, preserved deliberately.
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 10))
            .await
            .unwrap();

        let purchase = store
            .create_purchase(NewPurchase {
                supplier_id: None,
                items: vec![PurchaseLineRequest {
                    product_id: product.id,
                    quantity: 4,
                    unit_price: Money::from_cents(250),
                }],
                expected_delivery: None,
                created_by: user.id,
            })
            .await
            .unwrap();

        assert_eq!(purchase.total_amount, Money::from_cents(1000));
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert_eq!(stock_of(&store, product.id).await, 10);

        store.cancel_purchase(purchase.id).await.unwrap();
        assert_eq!(stock_of(&store, product.id).await, 6);
        assert!(store.purchase(purchase.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purchase_cancellation_refuses_to_go_negative() {
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 2))
            .await
            .unwrap();

        let purchase = store
            .create_purchase(NewPurchase {
                supplier_id: None,
                items: vec![PurchaseLineRequest {
                    product_id: product.id,
                    quantity: 5,
                    unit_price: Money::from_cents(100),
                }],
                expected_delivery: None,
                created_by: user.id,
            })
            .await
            .unwrap();

        let err = store.cancel_purchase(purchase.id).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::BusinessRule(_)));

        // Nothing happened: stock untouched, purchase still on record.
        assert_eq!(stock_of(&store, product.id).await, 2);
        assert!(store.purchase(purchase.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purchase_status_updates_within_the_closed_set() {
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 0))
            .await
            .unwrap();
        let purchase = store
            .create_purchase(NewPurchase {
                supplier_id: None,
                items: vec![PurchaseLineRequest {
                    product_id: product.id,
                    quantity: 1,
                    unit_price: Money::from_cents(100),
                }],
                expected_delivery: None,
                created_by: user.id,
            })
            .await
            .unwrap();

        let updated = store
            .update_purchase_status(purchase.id, PurchaseStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, PurchaseStatus::Completed);

        let err = store
            .update_purchase_status(PurchaseId::new(), PurchaseStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn referenced_product_cannot_be_deleted() {
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 5))
            .await
            .unwrap();
        let sale = store
            .create_sale(NewSale {
                customer_id: None,
                items: vec![SaleLineRequest {
                    product_id: product.id,
                    quantity: 1,
                }],
                payment_method: "cash".to_string(),
                created_by: user.id,
            })
            .await
            .unwrap();

        let err = store.delete_product(product.id).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::Conflict(_)));

        // Once the sale is cancelled the product is deletable again.
        store.cancel_sale(sale.id).await.unwrap();
        store.delete_product(product.id).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_a_customer_detaches_their_sales() {
        let store = MemoryStore::new();
        let user = seed_user(&store).await;
        let customer = store
            .create_customer(NewCustomer {
                name: "Ana".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let product = store
            .create_product(new_product("A", "SKU-A", 1000, 5))
            .await
            .unwrap();
        let sale = store
            .create_sale(NewSale {
                customer_id: Some(customer.id),
                items: vec![SaleLineRequest {
                    product_id: product.id,
                    quantity: 1,
                }],
                payment_method: "card".to_string(),
                created_by: user.id,
            })
            .await
            .unwrap();

        store.delete_customer(customer.id).await.unwrap();

        let detail = store.sale(sale.id).await.unwrap().unwrap();
        assert_eq!(detail.summary.sale.customer_id, None);
        assert_eq!(detail.summary.customer_name, None);
    }

    #[tokio::test]
    async fn product_search_and_pagination() {
        let store = MemoryStore::new();
        for (name, sku) in [("Blue Widget", "WID-B"), ("Red Widget", "WID-R"), ("Gadget", "GAD-1")] {
            store
                .create_product(new_product(name, sku, 1000, 5))
                .await
                .unwrap();
        }

        let widgets = store
            .list_products(Search::new(Some("widget".to_string())), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(widgets.total, 2);

        let by_sku = store
            .list_products(Search::new(Some("gad".to_string())), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(by_sku.total, 1);
        assert_eq!(by_sku.items[0].product.name, "Gadget");

        let paged = store
            .list_products(Search::any(), PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(paged.total, 3);
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.pages, 2);
    }

    #[tokio::test]
    async fn low_stock_lists_most_depleted_first() {
        let store = MemoryStore::new();
        let mut low = new_product("Low", "SKU-L", 1000, 1);
        low.min_stock = 5;
        let mut lower = new_product("Lower", "SKU-LL", 1000, 0);
        lower.min_stock = 5;
        let healthy = new_product("Healthy", "SKU-H", 1000, 50);

        store.create_product(low).await.unwrap();
        store.create_product(lower).await.unwrap();
        store.create_product(healthy).await.unwrap();

        let low_stock = store.low_stock_products().await.unwrap();
        let names: Vec<&str> = low_stock.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Lower", "Low"]);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = MemoryStore::new();
        seed_user(&store).await;

        let err = store
            .create_user(RegisterUser {
                username: "operator".to_string(),
                email: "other@example.com".to_string(),
                password_hash: PasswordHash::from_stored("x".to_string()),
                role: Role::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::Conflict(_)));
    }
}
