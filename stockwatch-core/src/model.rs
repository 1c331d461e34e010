use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default low-stock threshold for newly onboarded products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
}

/// A company warehouse. Warehouse names are not unique within a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
}

/// Catalog product. The SKU is globally unique and immutable once assigned.
/// A `low_stock_threshold` of zero disables low-stock alerting for the
/// product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub supplier_id: Option<Uuid>,
    pub low_stock_threshold: i32,
}

/// Fields of a product that does not exist yet; the id is assigned by the
/// onboarding transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub supplier_id: Option<Uuid>,
    pub low_stock_threshold: i32,
}

/// Stock on hand for one product in one warehouse. At most one row exists
/// per (product, warehouse) pair. `quantity` is authoritative; the change
/// log is advisory history, not the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i32,
}

/// One append-only ledger entry. Positive `change` is stock added, negative
/// is stock removed or sold. Never updated or deleted by normal flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub change: i32,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// A product sold as a bundle of other products. Present for schema
/// compatibility only; no stock computation consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: Uuid,
    pub bundle_product_id: Uuid,
    pub component_product_ids: Vec<Uuid>,
}

/// Joined read used by the alert scan: one inventory row together with its
/// product, warehouse and (optional) supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRow {
    pub inventory: Inventory,
    pub product: Product,
    pub warehouse: Warehouse,
    pub supplier: Option<Supplier>,
}
