use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use stockwatch_core::{
    ChangeLogEntry, Inventory, Product, StockLedger, StockRow, StoreError, StoreResult,
    Supplier, Warehouse,
};

use crate::database::{backend, map_sqlx, with_tx};

pub struct PgStockLedger {
    pool: PgPool,
}

impl PgStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct InventoryRow {
    id: Uuid,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i32,
}

impl From<InventoryRow> for Inventory {
    fn from(row: InventoryRow) -> Self {
        Inventory {
            id: row.id,
            product_id: row.product_id,
            warehouse_id: row.warehouse_id,
            quantity: row.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChangeLogRow {
    id: Uuid,
    inventory_id: Uuid,
    change: i32,
    timestamp: DateTime<Utc>,
    reason: Option<String>,
}

/// One row of the joined alert-scan query: inventory + product + warehouse
/// + optional supplier, flattened.
#[derive(sqlx::FromRow)]
struct CompanyStockRow {
    inventory_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    product_name: String,
    sku: String,
    price: Decimal,
    low_stock_threshold: i32,
    warehouse_id: Uuid,
    company_id: Uuid,
    warehouse_name: String,
    supplier_id: Option<Uuid>,
    supplier_name: Option<String>,
    supplier_email: Option<String>,
}

impl From<CompanyStockRow> for StockRow {
    fn from(row: CompanyStockRow) -> Self {
        StockRow {
            inventory: Inventory {
                id: row.inventory_id,
                product_id: row.product_id,
                warehouse_id: row.warehouse_id,
                quantity: row.quantity,
            },
            product: Product {
                id: row.product_id,
                name: row.product_name,
                sku: row.sku,
                price: row.price,
                supplier_id: row.supplier_id,
                low_stock_threshold: row.low_stock_threshold,
            },
            warehouse: Warehouse {
                id: row.warehouse_id,
                company_id: row.company_id,
                name: row.warehouse_name,
            },
            supplier: match (row.supplier_id, row.supplier_name, row.supplier_email) {
                (Some(id), Some(name), Some(contact_email)) => Some(Supplier {
                    id,
                    name,
                    contact_email,
                }),
                _ => None,
            },
        }
    }
}

#[async_trait]
impl StockLedger for PgStockLedger {
    async fn inventory(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> StoreResult<Option<Inventory>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            "SELECT id, product_id, warehouse_id, quantity FROM inventories \
             WHERE product_id = $1 AND warehouse_id = $2",
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Inventory::from))
    }

    async fn create_inventory(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Inventory> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO inventories (id, product_id, warehouse_id, quantity) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(product_id)
        .bind(warehouse_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(Inventory {
            id,
            product_id,
            warehouse_id,
            quantity,
        })
    }

    async fn append_change(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
    ) -> StoreResult<ChangeLogEntry> {
        let row = sqlx::query_as::<_, ChangeLogRow>(
            "INSERT INTO inventory_change_log (id, inventory_id, change, reason) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, inventory_id, change, timestamp, reason",
        )
        .bind(Uuid::new_v4())
        .bind(inventory_id)
        .bind(delta)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(ChangeLogEntry {
            id: row.id,
            inventory_id: row.inventory_id,
            change: row.change,
            timestamp: row.timestamp,
            reason: row.reason,
        })
    }

    async fn apply_change(
        &self,
        inventory_id: Uuid,
        delta: i32,
        reason: Option<&str>,
    ) -> StoreResult<Inventory> {
        let reason = reason.map(str::to_owned);

        with_tx(&self.pool, move |tx| {
            async move {
                // Guard the non-negative invariant in the UPDATE itself so
                // concurrent adjustments cannot drive quantity below zero.
                let updated = sqlx::query_as::<_, InventoryRow>(
                    "UPDATE inventories SET quantity = quantity + $2 \
                     WHERE id = $1 AND quantity + $2 >= 0 \
                     RETURNING id, product_id, warehouse_id, quantity",
                )
                .bind(inventory_id)
                .bind(delta)
                .fetch_optional(&mut **tx)
                .await
                .map_err(backend)?;

                let inventory = match updated {
                    Some(row) => Inventory::from(row),
                    None => {
                        let exists = sqlx::query_scalar::<_, i64>(
                            "SELECT COUNT(*) FROM inventories WHERE id = $1",
                        )
                        .bind(inventory_id)
                        .fetch_one(&mut **tx)
                        .await
                        .map_err(backend)?;

                        return if exists == 0 {
                            Err(StoreError::NotFound("inventory"))
                        } else {
                            Err(StoreError::Conflict(format!(
                                "change of {delta} would make inventory {inventory_id} negative"
                            )))
                        };
                    }
                };

                sqlx::query(
                    "INSERT INTO inventory_change_log (id, inventory_id, change, reason) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(inventory_id)
                .bind(delta)
                .bind(reason)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx)?;

                Ok(inventory)
            }
            .boxed()
        })
        .await
    }

    async fn sum_negative_changes(
        &self,
        inventory_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(ABS(change)), 0)::BIGINT FROM inventory_change_log \
             WHERE inventory_id = $1 AND change < 0 AND timestamp >= $2",
        )
        .bind(inventory_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(total)
    }

    async fn company_stock(&self, company_id: Uuid) -> StoreResult<Vec<StockRow>> {
        let rows = sqlx::query_as::<_, CompanyStockRow>(
            "SELECT i.id AS inventory_id, i.quantity, \
                    p.id AS product_id, p.name AS product_name, p.sku, p.price, \
                    p.low_stock_threshold, \
                    w.id AS warehouse_id, w.company_id, w.name AS warehouse_name, \
                    s.id AS supplier_id, s.name AS supplier_name, \
                    s.contact_email AS supplier_email \
             FROM inventories i \
             JOIN products p ON p.id = i.product_id \
             JOIN warehouses w ON w.id = i.warehouse_id \
             LEFT JOIN suppliers s ON s.id = p.supplier_id \
             WHERE w.company_id = $1 \
             ORDER BY i.id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(StockRow::from).collect())
    }
}
