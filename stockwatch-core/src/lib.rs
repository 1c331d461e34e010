pub mod model;
pub mod repository;

pub use model::{
    Bundle, ChangeLogEntry, Company, Inventory, NewProduct, Product, StockRow, Supplier,
    Warehouse,
};
pub use repository::{CatalogStore, OnboardingStore, StockLedger};

/// Storage-layer error taxonomy. Lookup misses are modeled as `Ok(None)` on
/// the read traits; `NotFound` is reserved for writes against a missing row.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Unavailable(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
