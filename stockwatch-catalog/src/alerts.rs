use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use stockwatch_core::{StockLedger, StoreResult};

/// Sales lookback window used when none is configured.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Contact details for reordering. All fields are null when the product has
/// no supplier, matching the wire shape of the alert feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierSummary {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub current_stock: i32,
    pub threshold: i32,
    pub days_until_stockout: Option<i64>,
    pub supplier: SupplierSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<LowStockAlert>,
    pub total_alerts: usize,
}

/// Scans a company's inventories and produces low-stock alerts with a
/// projected stockout date derived from recent sales velocity.
///
/// An inventory row is alerted when all of the following hold:
/// - the product's threshold is non-zero (zero disables alerting),
/// - quantity is strictly below the threshold,
/// - at least one unit was sold (negative ledger entry) inside the
///   lookback window; rows with no recent sales are treated as inactive.
pub struct AlertEngine {
    ledger: Arc<dyn StockLedger>,
    lookback_days: i64,
}

impl AlertEngine {
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self::with_lookback(ledger, DEFAULT_LOOKBACK_DAYS)
    }

    pub fn with_lookback(ledger: Arc<dyn StockLedger>, lookback_days: i64) -> Self {
        Self {
            ledger,
            lookback_days,
        }
    }

    /// Read-only scan. Alerts come back in a stable order (ascending
    /// inventory id), so repeated calls without intervening writes return
    /// identical reports. An unknown company simply has no warehouses to
    /// scan and yields an empty report.
    pub async fn low_stock_alerts(
        &self,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<AlertReport> {
        let since = now - Duration::days(self.lookback_days);
        let mut alerts = Vec::new();

        for row in self.ledger.company_stock(company_id).await? {
            let threshold = row.product.low_stock_threshold;
            if threshold == 0 {
                continue;
            }
            if row.inventory.quantity >= threshold {
                continue;
            }

            let total_sold = self
                .ledger
                .sum_negative_changes(row.inventory.id, since)
                .await?;
            if total_sold == 0 {
                continue;
            }

            let daily_rate = total_sold as f64 / self.lookback_days as f64;
            // total_sold > 0 makes the rate positive here; the None branch
            // exists for interface completeness.
            let days_until_stockout = if daily_rate > 0.0 {
                Some((row.inventory.quantity as f64 / daily_rate) as i64)
            } else {
                None
            };

            alerts.push(LowStockAlert {
                product_id: row.product.id,
                product_name: row.product.name,
                sku: row.product.sku,
                warehouse_id: row.warehouse.id,
                warehouse_name: row.warehouse.name,
                current_stock: row.inventory.quantity,
                threshold,
                days_until_stockout,
                supplier: SupplierSummary {
                    id: row.supplier.as_ref().map(|s| s.id),
                    name: row.supplier.as_ref().map(|s| s.name.clone()),
                    contact_email: row.supplier.map(|s| s.contact_email),
                },
            });
        }

        tracing::debug!(%company_id, total = alerts.len(), "low stock scan complete");
        Ok(AlertReport {
            total_alerts: alerts.len(),
            alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use stockwatch_core::{NewProduct, OnboardingStore, StoreResult};
    use stockwatch_store::memory::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        company_id: Uuid,
        warehouse_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let company = store.add_company("Acme").await;
        let warehouse = store.add_warehouse(company.id, "Main").await;
        Fixture {
            store,
            company_id: company.id,
            warehouse_id: warehouse.id,
        }
    }

    impl Fixture {
        fn engine(&self) -> AlertEngine {
            AlertEngine::new(Arc::new(self.store.clone()))
        }

        async fn add_product(
            &self,
            sku: &str,
            threshold: i32,
            quantity: i32,
        ) -> StoreResult<Uuid> {
            self.store
                .insert_product_with_stock(
                    NewProduct {
                        name: format!("Product {sku}"),
                        sku: sku.into(),
                        price: Decimal::new(500, 2),
                        supplier_id: None,
                        low_stock_threshold: threshold,
                    },
                    self.warehouse_id,
                    quantity,
                )
                .await
        }

        async fn sell(&self, product_id: Uuid, units: i32, days_ago: i64) {
            let inventory = self
                .store
                .inventory(product_id, self.warehouse_id)
                .await
                .unwrap()
                .unwrap();
            self.store
                .record_change_at(
                    inventory.id,
                    -units,
                    Some("sale"),
                    Utc::now() - Duration::days(days_ago),
                )
                .await;
        }
    }

    #[tokio::test]
    async fn projects_stockout_from_recent_sales() {
        let fx = fixture().await;
        let product_id = fx.add_product("LOW-1", 60, 50).await.unwrap();
        fx.sell(product_id, 30, 5).await;

        let report = fx
            .engine()
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();

        assert_eq!(report.total_alerts, 1);
        let alert = &report.alerts[0];
        assert_eq!(alert.product_id, product_id);
        assert_eq!(alert.current_stock, 50);
        assert_eq!(alert.threshold, 60);
        // 30 units over 30 days => 1.0/day => 50 days of stock left.
        assert_eq!(alert.days_until_stockout, Some(50));
        assert_eq!(alert.supplier.id, None);
    }

    #[tokio::test]
    async fn adequate_stock_is_never_alerted() {
        let fx = fixture().await;
        let product_id = fx.add_product("OK-1", 10, 10).await.unwrap();
        fx.sell(product_id, 100, 2).await;

        let report = fx
            .engine()
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_alerts, 0);
    }

    #[tokio::test]
    async fn no_recent_sales_means_inactive_not_alerted() {
        let fx = fixture().await;
        let product_id = fx.add_product("STALE-1", 10, 3).await.unwrap();
        // Sold plenty, but outside the 30-day window.
        fx.sell(product_id, 40, 45).await;

        let report = fx
            .engine()
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_alerts, 0);
    }

    #[tokio::test]
    async fn zero_threshold_disables_alerting() {
        let fx = fixture().await;
        let product_id = fx.add_product("OFF-1", 0, 1).await.unwrap();
        fx.sell(product_id, 20, 3).await;

        let report = fx
            .engine()
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_alerts, 0);
    }

    #[tokio::test]
    async fn positive_restocks_do_not_count_as_sales() {
        let fx = fixture().await;
        let product_id = fx.add_product("RESTOCK-1", 10, 3).await.unwrap();
        let inventory = fx
            .store
            .inventory(product_id, fx.warehouse_id)
            .await
            .unwrap()
            .unwrap();
        fx.store
            .record_change_at(inventory.id, 25, Some("restock"), Utc::now())
            .await;

        let report = fx
            .engine()
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_alerts, 0);
    }

    #[tokio::test]
    async fn includes_supplier_summary_when_present() {
        let fx = fixture().await;
        let supplier = fx.store.add_supplier("Parts Co", "parts@example.com").await;
        let product_id = fx
            .store
            .insert_product_with_stock(
                NewProduct {
                    name: "Gadget".into(),
                    sku: "SUP-1".into(),
                    price: Decimal::new(500, 2),
                    supplier_id: Some(supplier.id),
                    low_stock_threshold: 10,
                },
                fx.warehouse_id,
                4,
            )
            .await
            .unwrap();
        fx.sell(product_id, 6, 1).await;

        let report = fx
            .engine()
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_alerts, 1);
        let supplier_summary = &report.alerts[0].supplier;
        assert_eq!(supplier_summary.id, Some(supplier.id));
        assert_eq!(supplier_summary.name.as_deref(), Some("Parts Co"));
        assert_eq!(
            supplier_summary.contact_email.as_deref(),
            Some("parts@example.com")
        );
    }

    #[tokio::test]
    async fn unknown_company_yields_empty_report() {
        let fx = fixture().await;
        let report = fx
            .engine()
            .low_stock_alerts(Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_alerts, 0);
        assert!(report.alerts.is_empty());
    }

    #[tokio::test]
    async fn repeated_scans_are_identical() {
        let fx = fixture().await;
        for (i, qty) in [(1, 2), (2, 4), (3, 6)] {
            let product_id = fx.add_product(&format!("REP-{i}"), 10, qty).await.unwrap();
            fx.sell(product_id, 9, i).await;
        }

        let engine = fx.engine();
        let now = Utc::now();
        let first = engine.low_stock_alerts(fx.company_id, now).await.unwrap();
        let second = engine.low_stock_alerts(fx.company_id, now).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_alerts, 3);
    }

    #[tokio::test]
    async fn custom_lookback_window_changes_the_rate() {
        let fx = fixture().await;
        let product_id = fx.add_product("WIN-1", 60, 50).await.unwrap();
        fx.sell(product_id, 30, 5).await;

        let engine = AlertEngine::with_lookback(Arc::new(fx.store.clone()), 10);
        let report = engine
            .low_stock_alerts(fx.company_id, Utc::now())
            .await
            .unwrap();
        // 30 units over a 10-day window => 3.0/day => 16 days (truncated).
        assert_eq!(report.alerts[0].days_until_stockout, Some(16));
    }
}
