use std::time::Duration;

use anyhow::anyhow;
use futures_util::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use stockwatch_core::{StoreError, StoreResult};

#[derive(Clone)]
pub struct DbClient {
    pub pool: PgPool,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Scoped unit of work: opens a transaction, hands it to `op`, commits on
/// `Ok` and rolls back on `Err` — on every exit path, so a failure midway
/// through a multi-row write leaves no partial state behind.
pub async fn with_tx<T, F>(pool: &PgPool, op: F) -> StoreResult<T>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, StoreResult<T>>,
{
    let mut tx = pool.begin().await.map_err(backend)?;
    match op(&mut tx).await {
        Ok(value) => {
            tx.commit().await.map_err(backend)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// Maps a sqlx error into the store taxonomy. Unique-index violations
/// become `Conflict` so callers can translate races on `products.sku` or
/// the (product, warehouse) pair into field errors.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique constraint");
            return StoreError::Conflict(constraint.to_string());
        }
    }
    backend(err)
}

pub(crate) fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(anyhow!(err))
}
