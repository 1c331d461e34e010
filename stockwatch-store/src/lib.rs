pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod ledger_repo;
pub mod memory;

pub use catalog_repo::{PgCatalogStore, PgOnboardingStore};
pub use database::DbClient;
pub use ledger_repo::PgStockLedger;
pub use memory::MemoryStore;
