use std::net::SocketAddr;
use std::sync::Arc;

use stockwatch_api::{app, AppState};
use stockwatch_store::{DbClient, PgCatalogStore, PgOnboardingStore, PgStockLedger};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockwatch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = stockwatch_store::app_config::Config::load()?;
    tracing::info!("Starting Stockwatch API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections).await?;
    db.migrate().await?;

    let state = AppState {
        catalog: Arc::new(PgCatalogStore::new(db.pool.clone())),
        ledger: Arc::new(PgStockLedger::new(db.pool.clone())),
        onboarding: Arc::new(PgOnboardingStore::new(db.pool.clone())),
        lookback_days: config.alerts.lookback_days,
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
