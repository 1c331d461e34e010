use std::sync::Arc;

use stockwatch_core::{CatalogStore, OnboardingStore, StockLedger};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: Arc<dyn StockLedger>,
    pub onboarding: Arc<dyn OnboardingStore>,
    /// Sales lookback window for the low-stock scan, in days.
    pub lookback_days: i64,
}
