use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use stockwatch_catalog::alerts::{AlertEngine, AlertReport};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/companies/{company_id}/alerts/low-stock",
        get(low_stock_alerts),
    )
}

/// GET /companies/{company_id}/alerts/low-stock
/// A company with no warehouses simply has no inventories to scan, so an
/// unknown id returns an empty list rather than an error.
pub async fn low_stock_alerts(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<AlertReport>, AppError> {
    let engine = AlertEngine::with_lookback(state.ledger.clone(), state.lookback_days);
    let report = engine.low_stock_alerts(company_id, Utc::now()).await?;
    Ok(Json(report))
}
