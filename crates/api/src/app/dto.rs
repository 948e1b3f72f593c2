use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use comercio_auth::{Role, User};
use comercio_core::{CustomerId, Money, PageRequest, Paginated, ProductId, SupplierId};
use comercio_parties::{ContactInfo, Customer, NewCustomer, NewSupplier, Supplier};
use comercio_products::{NewProduct, Product, Sku};
use comercio_purchasing::{Purchase, PurchaseStatus};
use comercio_sales::Sale;
use comercio_store::{
    DateRange, ProductWithSupplier, PurchaseDetail, PurchaseSummary, SaleDetail, SaleSummary,
    Search,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sku: Sku,
    pub price: Money,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
}

impl ProductPayload {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            sku: self.sku,
            price: self.price,
            stock_quantity: self.stock_quantity,
            min_stock: self.min_stock,
            supplier_id: self.supplier_id,
        }
    }
}

/// Customers and suppliers share the same wire shape.
#[derive(Debug, Deserialize)]
pub struct PartyPayload {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl PartyPayload {
    fn contact(&self) -> ContactInfo {
        ContactInfo {
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        }
    }

    pub fn into_new_customer(self) -> NewCustomer {
        NewCustomer {
            contact: self.contact(),
            name: self.name,
            tax_id: self.tax_id,
        }
    }

    pub fn into_new_supplier(self) -> NewSupplier {
        NewSupplier {
            contact: self.contact(),
            name: self.name,
            tax_id: self.tax_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(10))
    }

    pub fn search(&self) -> Search {
        Search::new(self.search.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl DateRangeParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(10))
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Deserialize)]
pub struct SaleItemPayload {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub items: Vec<SaleItemPayload>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseItemPayload {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub items: Vec<PurchaseItemPayload>,
    #[serde(default)]
    pub expected_delivery: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseStatusRequest {
    pub status: PurchaseStatus,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> serde_json::Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "role": user.role,
        "created_at": user.created_at,
    })
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id,
        "name": product.name,
        "description": product.description,
        "sku": product.sku.as_str(),
        "price": product.price,
        "stock_quantity": product.stock_quantity,
        "min_stock": product.min_stock,
        "supplier_id": product.supplier_id,
        "created_at": product.created_at,
    })
}

pub fn product_with_supplier_to_json(row: &ProductWithSupplier) -> serde_json::Value {
    let mut value = product_to_json(&row.product);
    value["supplier_name"] = json!(row.supplier_name);
    value
}

pub fn customer_to_json(customer: &Customer) -> serde_json::Value {
    json!({
        "id": customer.id,
        "name": customer.name,
        "email": customer.contact.email,
        "phone": customer.contact.phone,
        "address": customer.contact.address,
        "tax_id": customer.tax_id,
        "created_at": customer.created_at,
    })
}

pub fn supplier_to_json(supplier: &Supplier) -> serde_json::Value {
    json!({
        "id": supplier.id,
        "name": supplier.name,
        "email": supplier.contact.email,
        "phone": supplier.contact.phone,
        "address": supplier.contact.address,
        "tax_id": supplier.tax_id,
        "created_at": supplier.created_at,
    })
}

pub fn sale_to_json(sale: &Sale) -> serde_json::Value {
    json!({
        "id": sale.id,
        "customer_id": sale.customer_id,
        "total_amount": sale.total_amount,
        "payment_method": sale.payment_method,
        "created_by": sale.created_by,
        "created_at": sale.created_at,
    })
}

pub fn sale_summary_to_json(summary: &SaleSummary) -> serde_json::Value {
    let mut value = sale_to_json(&summary.sale);
    value["customer_name"] = json!(summary.customer_name);
    value["created_by_name"] = json!(summary.created_by_name);
    value
}

pub fn sale_detail_to_json(detail: &SaleDetail) -> serde_json::Value {
    let mut value = sale_summary_to_json(&detail.summary);
    value["items"] = json!(detail
        .items
        .iter()
        .map(|item| json!({
            "product_id": item.product_id,
            "product_name": item.product_name,
            "quantity": item.quantity,
            "unit_price": item.unit_price,
            "total_price": item.total_price,
        }))
        .collect::<Vec<_>>());
    value
}

pub fn purchase_to_json(purchase: &Purchase) -> serde_json::Value {
    json!({
        "id": purchase.id,
        "supplier_id": purchase.supplier_id,
        "total_amount": purchase.total_amount,
        "status": purchase.status,
        "expected_delivery": purchase.expected_delivery,
        "created_by": purchase.created_by,
        "created_at": purchase.created_at,
    })
}

pub fn purchase_summary_to_json(summary: &PurchaseSummary) -> serde_json::Value {
    let mut value = purchase_to_json(&summary.purchase);
    value["supplier_name"] = json!(summary.supplier_name);
    value["created_by_name"] = json!(summary.created_by_name);
    value
}

pub fn purchase_detail_to_json(detail: &PurchaseDetail) -> serde_json::Value {
    let mut value = purchase_summary_to_json(&detail.summary);
    value["items"] = json!(detail
        .items
        .iter()
        .map(|item| json!({
            "product_id": item.product_id,
            "product_name": item.product_name,
            "quantity": item.quantity,
            "unit_price": item.unit_price,
            "total_price": item.total_price,
        }))
        .collect::<Vec<_>>());
    value
}

pub fn paginated_to_json<T>(
    page: &Paginated<T>,
    item_to_json: impl Fn(&T) -> serde_json::Value,
) -> serde_json::Value {
    json!({
        "items": page.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
    })
}
