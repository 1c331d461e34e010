use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use stockwatch_core::{
    CatalogStore, ChangeLogEntry, Company, Inventory, NewProduct, OnboardingStore, Product,
    StockLedger, StockRow, StoreError, StoreResult, Supplier, Warehouse,
};

#[derive(Default)]
struct Inner {
    companies: HashMap<Uuid, Company>,
    warehouses: HashMap<Uuid, Warehouse>,
    suppliers: HashMap<Uuid, Supplier>,
    products: HashMap<Uuid, Product>,
    inventories: HashMap<Uuid, Inventory>,
    changes: Vec<ChangeLogEntry>,
}

/// In-memory implementation of the store traits, used by tests and local
/// development. A single lock around all tables gives every operation the
/// same snapshot/atomicity guarantees the Postgres store gets from
/// transactions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    fail_inventory_insert: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_company(&self, name: &str) -> Company {
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.inner
            .write()
            .await
            .companies
            .insert(company.id, company.clone());
        company
    }

    pub async fn add_warehouse(&self, company_id: Uuid, name: &str) -> Warehouse {
        let warehouse = Warehouse {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
        };
        self.inner
            .write()
            .await
            .warehouses
            .insert(warehouse.id, warehouse.clone());
        warehouse
    }

    pub async fn add_supplier(&self, name: &str, contact_email: &str) -> Supplier {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: name.to_string(),
            contact_email: contact_email.to_string(),
        };
        self.inner
            .write()
            .await
            .suppliers
            .insert(supplier.id, supplier.clone());
        supplier
    }

    /// Appends a ledger entry with an explicit timestamp. Tests use this to
    /// backdate sales relative to the lookback window; `append_change`
    /// always stamps entries with the current time.
    pub async fn record_change_at(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> ChangeLogEntry {
        let entry = ChangeLogEntry {
            id: Uuid::new_v4(),
            inventory_id,
            change: delta,
            timestamp: at,
            reason: reason.map(str::to_owned),
        };
        self.inner.write().await.changes.push(entry.clone());
        entry
    }

    /// Makes the next `insert_product_with_stock` fail between its two
    /// writes, for exercising rollback behavior.
    pub fn fail_next_inventory_insert(&self) {
        self.fail_inventory_insert.store(true, Ordering::SeqCst);
    }
}

impl Inner {
    fn inventory_for_pair(&self, product_id: Uuid, warehouse_id: Uuid) -> Option<&Inventory> {
        self.inventories
            .values()
            .find(|i| i.product_id == product_id && i.warehouse_id == warehouse_id)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.inner.read().await.companies.get(&id).cloned())
    }

    async fn warehouse(&self, id: Uuid) -> StoreResult<Option<Warehouse>> {
        Ok(self.inner.read().await.warehouses.get(&id).cloned())
    }

    async fn warehouses_by_company(&self, company_id: Uuid) -> StoreResult<Vec<Warehouse>> {
        let inner = self.inner.read().await;
        let mut warehouses: Vec<Warehouse> = inner
            .warehouses
            .values()
            .filter(|w| w.company_id == company_id)
            .cloned()
            .collect();
        warehouses.sort_by_key(|w| w.id);
        Ok(warehouses)
    }

    async fn supplier(&self, id: Uuid) -> StoreResult<Option<Supplier>> {
        Ok(self.inner.read().await.suppliers.get(&id).cloned())
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.values().find(|p| p.sku == sku).cloned())
    }
}

#[async_trait]
impl StockLedger for MemoryStore {
    async fn inventory(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> StoreResult<Option<Inventory>> {
        let inner = self.inner.read().await;
        Ok(inner.inventory_for_pair(product_id, warehouse_id).cloned())
    }

    async fn create_inventory(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Inventory> {
        let mut inner = self.inner.write().await;
        if inner.inventory_for_pair(product_id, warehouse_id).is_some() {
            return Err(StoreError::Conflict(format!(
                "inventory already exists for product {product_id} in warehouse {warehouse_id}"
            )));
        }
        let inventory = Inventory {
            id: Uuid::new_v4(),
            product_id,
            warehouse_id,
            quantity,
        };
        inner.inventories.insert(inventory.id, inventory.clone());
        Ok(inventory)
    }

    async fn append_change(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
    ) -> StoreResult<ChangeLogEntry> {
        let mut inner = self.inner.write().await;
        if !inner.inventories.contains_key(&inventory_id) {
            return Err(StoreError::NotFound("inventory"));
        }
        let entry = ChangeLogEntry {
            id: Uuid::new_v4(),
            inventory_id,
            change: delta,
            timestamp: Utc::now(),
            reason: reason.map(str::to_owned),
        };
        inner.changes.push(entry.clone());
        Ok(entry)
    }

    async fn apply_change(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
    ) -> StoreResult<Inventory> {
        let mut inner = self.inner.write().await;
        let inventory = inner
            .inventories
            .get_mut(&inventory_id)
            .ok_or(StoreError::NotFound("inventory"))?;
        let next = inventory.quantity + delta;
        if next < 0 {
            return Err(StoreError::Conflict(format!(
                "change of {delta} would make inventory {inventory_id} negative"
            )));
        }
        inventory.quantity = next;
        let snapshot = inventory.clone();
        inner.changes.push(ChangeLogEntry {
            id: Uuid::new_v4(),
            inventory_id,
            change: delta,
            timestamp: Utc::now(),
            reason: reason.map(str::to_owned),
        });
        Ok(snapshot)
    }

    async fn sum_negative_changes(
        &self,
        inventory_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .changes
            .iter()
            .filter(|c| c.inventory_id == inventory_id && c.change < 0 && c.timestamp >= since)
            .map(|c| i64::from(c.change.unsigned_abs()))
            .sum())
    }

    async fn company_stock(&self, company_id: Uuid) -> StoreResult<Vec<StockRow>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<StockRow> = inner
            .inventories
            .values()
            .filter_map(|inventory| {
                let warehouse = inner.warehouses.get(&inventory.warehouse_id)?;
                if warehouse.company_id != company_id {
                    return None;
                }
                let product = inner.products.get(&inventory.product_id)?;
                let supplier = product
                    .supplier_id
                    .and_then(|id| inner.suppliers.get(&id))
                    .cloned();
                Some(StockRow {
                    inventory: inventory.clone(),
                    product: product.clone(),
                    warehouse: warehouse.clone(),
                    supplier,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.inventory.id);
        Ok(rows)
    }
}

#[async_trait]
impl OnboardingStore for MemoryStore {
    async fn insert_product_with_stock(
        &self,
        product: NewProduct,
        warehouse_id: Uuid,
        initial_quantity: i32,
    ) -> StoreResult<Uuid> {
        let mut inner = self.inner.write().await;

        if inner.products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::Conflict(format!(
                "duplicate sku {}",
                product.sku
            )));
        }

        let product_id = Uuid::new_v4();
        let record = Product {
            id: product_id,
            name: product.name,
            sku: product.sku,
            price: product.price,
            supplier_id: product.supplier_id,
            low_stock_threshold: product.low_stock_threshold,
        };
        inner.products.insert(product_id, record);

        // Injected fault or pair conflict after the product write: undo it,
        // as the database transaction would.
        let fault = self.fail_inventory_insert.swap(false, Ordering::SeqCst);
        if fault {
            inner.products.remove(&product_id);
            return Err(StoreError::Unavailable(anyhow!(
                "injected inventory insert failure"
            )));
        }
        if inner.inventory_for_pair(product_id, warehouse_id).is_some() {
            inner.products.remove(&product_id);
            return Err(StoreError::Conflict(format!(
                "inventory already exists for product {product_id} in warehouse {warehouse_id}"
            )));
        }

        let inventory = Inventory {
            id: Uuid::new_v4(),
            product_id,
            warehouse_id,
            quantity: initial_quantity,
        };
        inner.inventories.insert(inventory.id, inventory);

        Ok(product_id)
    }
}
