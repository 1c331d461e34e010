use async_trait::async_trait;
use futures_util::FutureExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use stockwatch_core::{
    CatalogStore, Company, NewProduct, OnboardingStore, Product, StoreResult, Supplier,
    Warehouse,
};

use crate::database::{backend, map_sqlx, with_tx};

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
}

#[derive(sqlx::FromRow)]
struct WarehouseRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    contact_email: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) sku: String,
    pub(crate) price: Decimal,
    pub(crate) supplier_id: Option<Uuid>,
    pub(crate) low_stock_threshold: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            sku: row.sku,
            price: row.price,
            supplier_id: row.supplier_id,
            low_stock_threshold: row.low_stock_threshold,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, sku, price, supplier_id, low_stock_threshold";

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT id, name FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Ok(row.map(|r| Company {
            id: r.id,
            name: r.name,
        }))
    }

    async fn warehouse(&self, id: Uuid) -> StoreResult<Option<Warehouse>> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            "SELECT id, company_id, name FROM warehouses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|r| Warehouse {
            id: r.id,
            company_id: r.company_id,
            name: r.name,
        }))
    }

    async fn warehouses_by_company(&self, company_id: Uuid) -> StoreResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, WarehouseRow>(
            "SELECT id, company_id, name FROM warehouses WHERE company_id = $1 ORDER BY id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|r| Warehouse {
                id: r.id,
                company_id: r.company_id,
                name: r.name,
            })
            .collect())
    }

    async fn supplier(&self, id: Uuid) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, contact_email FROM suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|r| Supplier {
            id: r.id,
            name: r.name,
            contact_email: r.contact_email,
        }))
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Product::from))
    }

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Product::from))
    }
}

pub struct PgOnboardingStore {
    pool: PgPool,
}

impl PgOnboardingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OnboardingStore for PgOnboardingStore {
    async fn insert_product_with_stock(
        &self,
        product: NewProduct,
        warehouse_id: Uuid,
        initial_quantity: i32,
    ) -> StoreResult<Uuid> {
        let product_id = Uuid::new_v4();

        with_tx(&self.pool, move |tx| {
            async move {
                sqlx::query(
                    "INSERT INTO products (id, name, sku, price, supplier_id, low_stock_threshold) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(product_id)
                .bind(&product.name)
                .bind(&product.sku)
                .bind(product.price)
                .bind(product.supplier_id)
                .bind(product.low_stock_threshold)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx)?;

                sqlx::query(
                    "INSERT INTO inventories (id, product_id, warehouse_id, quantity) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(product_id)
                .bind(warehouse_id)
                .bind(initial_quantity)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx)?;

                Ok(product_id)
            }
            .boxed()
        })
        .await
    }
}
