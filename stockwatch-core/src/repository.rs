use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{
    ChangeLogEntry, Company, Inventory, NewProduct, Product, StockRow, Supplier, Warehouse,
};
use crate::StoreResult;

/// Read access to the catalog entities. Lookup misses are `Ok(None)`;
/// `Err` means the store itself failed.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn company(&self, id: Uuid) -> StoreResult<Option<Company>>;

    async fn warehouse(&self, id: Uuid) -> StoreResult<Option<Warehouse>>;

    async fn warehouses_by_company(&self, company_id: Uuid) -> StoreResult<Vec<Warehouse>>;

    async fn supplier(&self, id: Uuid) -> StoreResult<Option<Supplier>>;

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>>;
}

/// Per-(product, warehouse) stock quantities plus the append-only change
/// log.
#[async_trait]
pub trait StockLedger: Send + Sync {
    async fn inventory(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> StoreResult<Option<Inventory>>;

    /// Creates the inventory row for a (product, warehouse) pair. Fails
    /// with `Conflict` if the pair already has a row.
    async fn create_inventory(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Inventory>;

    /// Appends a signed delta to the change log with a server-assigned
    /// timestamp. Does not touch `Inventory.quantity`; callers that want
    /// the denormalized quantity kept in step use `apply_change`.
    async fn append_change(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
    ) -> StoreResult<ChangeLogEntry>;

    /// Atomically adjusts `Inventory.quantity` by `delta` and appends the
    /// matching log entry. Fails with `Conflict` if the resulting quantity
    /// would be negative.
    async fn apply_change(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
    ) -> StoreResult<Inventory>;

    /// Sum of |change| over entries with `change < 0` recorded at or after
    /// `since` for the given inventory.
    async fn sum_negative_changes(
        &self,
        inventory_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64>;

    /// Every inventory row in the company's warehouses joined with its
    /// product, warehouse and supplier, ordered by inventory id. Unknown
    /// companies yield an empty vec.
    async fn company_stock(&self, company_id: Uuid) -> StoreResult<Vec<StockRow>>;
}

/// Transactional write surface used by product onboarding.
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    /// Inserts the product and its initial inventory row in a single
    /// transaction. Either both rows persist or neither does. Uniqueness
    /// races (sku, or the (product, warehouse) pair) surface as `Conflict`.
    async fn insert_product_with_stock(
        &self,
        product: NewProduct,
        warehouse_id: Uuid,
        initial_quantity: i32,
    ) -> StoreResult<Uuid>;
}
