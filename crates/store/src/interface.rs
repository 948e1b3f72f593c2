//! The store contract: per-entity repositories plus the transaction
//! workflows as atomic operations.
//!
//! Every method is one unit of work. The sale/purchase workflows in
//! particular must leave no partial state behind on failure; both backends
//! guarantee that, the memory store by mutating only after all checks pass
//! and the Postgres store with a database transaction.

use async_trait::async_trait;
use chrono::NaiveDate;

use comercio_auth::{PasswordHash, Role, User};
use comercio_core::{
    CustomerId, Money, PageRequest, Paginated, ProductId, PurchaseId, SaleId, SupplierId, UserId,
};
use comercio_parties::{Customer, NewCustomer, NewSupplier, Supplier};
use comercio_products::{NewProduct, Product};
use comercio_purchasing::{Purchase, PurchaseLineRequest, PurchaseStatus};
use comercio_sales::{Sale, SaleLineRequest};

use crate::error::StoreResult;
use crate::filter::{DateRange, Search};

// -------------------------
// Read-side views
// -------------------------

/// A product together with its supplier's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWithSupplier {
    pub product: Product,
    pub supplier_name: Option<String>,
}

/// A sale header joined with customer and creator display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSummary {
    pub sale: Sale,
    pub customer_name: Option<String>,
    pub created_by_name: Option<String>,
}

/// One sale line joined with the product's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleItemDetail {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// A sale with its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDetail {
    pub summary: SaleSummary,
    pub items: Vec<SaleItemDetail>,
}

/// A purchase header joined with supplier and creator display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub purchase: Purchase,
    pub supplier_name: Option<String>,
    pub created_by_name: Option<String>,
}

/// One purchase line joined with the product's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseItemDetail {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// A purchase with its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDetail {
    pub summary: PurchaseSummary,
    pub items: Vec<PurchaseItemDetail>,
}

// -------------------------
// Workflow inputs
// -------------------------

/// Input to the create-sale workflow.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: Option<CustomerId>,
    pub items: Vec<SaleLineRequest>,
    pub payment_method: String,
    pub created_by: UserId,
}

/// Input to the create-purchase workflow.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub supplier_id: Option<SupplierId>,
    pub items: Vec<PurchaseLineRequest>,
    pub expected_delivery: Option<NaiveDate>,
    pub created_by: UserId,
}

/// Input to user registration; the password is already hashed.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role: Role,
}

// -------------------------
// Repositories
// -------------------------

#[async_trait]
pub trait ProductStore {
    /// Insert a new product. Duplicate SKU → Conflict, nothing inserted.
    async fn create_product(&self, new: NewProduct) -> StoreResult<Product>;

    async fn product(&self, id: ProductId) -> StoreResult<Option<ProductWithSupplier>>;

    /// Substring search over name and SKU, newest first.
    async fn list_products(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<ProductWithSupplier>>;

    /// Products at or below their reorder threshold, most depleted first.
    async fn low_stock_products(&self) -> StoreResult<Vec<Product>>;

    /// Full replace of the mutable fields. Missing product → NotFound.
    async fn update_product(&self, id: ProductId, new: NewProduct) -> StoreResult<Product>;

    /// Missing product → NotFound; product referenced by recorded
    /// sale/purchase items → Conflict.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

#[async_trait]
pub trait CustomerStore {
    async fn create_customer(&self, new: NewCustomer) -> StoreResult<Customer>;

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    /// Substring search over name, email and phone, newest first.
    async fn list_customers(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<Customer>>;

    async fn update_customer(&self, id: CustomerId, new: NewCustomer) -> StoreResult<Customer>;

    /// Deleting detaches the customer from historical sales (null reference).
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()>;
}

#[async_trait]
pub trait SupplierStore {
    async fn create_supplier(&self, new: NewSupplier) -> StoreResult<Supplier>;

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>>;

    async fn list_suppliers(
        &self,
        search: Search,
        page: PageRequest,
    ) -> StoreResult<Paginated<Supplier>>;

    async fn update_supplier(&self, id: SupplierId, new: NewSupplier) -> StoreResult<Supplier>;

    /// Deleting detaches the supplier from products and purchases.
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<()>;
}

#[async_trait]
pub trait SaleStore {
    /// The create-sale workflow: validate stock, snapshot catalog prices,
    /// compute totals, decrement stock, persist header + items, atomically.
    async fn create_sale(&self, new: NewSale) -> StoreResult<Sale>;

    async fn sale(&self, id: SaleId) -> StoreResult<Option<SaleDetail>>;

    async fn list_sales(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> StoreResult<Paginated<SaleSummary>>;

    /// The cancel-sale workflow: restock every item, then delete items and
    /// header, atomically. Missing sale → NotFound.
    async fn cancel_sale(&self, id: SaleId) -> StoreResult<()>;
}

#[async_trait]
pub trait PurchaseStore {
    /// The create-purchase workflow. Stock is deliberately not incremented
    /// here (see DESIGN.md on the inherited create/cancel asymmetry).
    async fn create_purchase(&self, new: NewPurchase) -> StoreResult<Purchase>;

    async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<PurchaseDetail>>;

    async fn list_purchases(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> StoreResult<Paginated<PurchaseSummary>>;

    /// Missing purchase → NotFound.
    async fn update_purchase_status(
        &self,
        id: PurchaseId,
        status: PurchaseStatus,
    ) -> StoreResult<Purchase>;

    /// The cancel-purchase workflow: deduct every item quantity from stock
    /// (refusing to go negative), then delete items and header, atomically.
    async fn cancel_purchase(&self, id: PurchaseId) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore {
    /// Duplicate username or email → Conflict.
    async fn create_user(&self, new: RegisterUser) -> StoreResult<User>;

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
}

/// The full persistence surface, as one injectable object.
pub trait Store:
    ProductStore + CustomerStore + SupplierStore + SaleStore + PurchaseStore + UserStore + Send + Sync
{
}

impl<T> Store for T where
    T: ProductStore + CustomerStore + SupplierStore + SaleStore + PurchaseStore + UserStore + Send + Sync
{
}
