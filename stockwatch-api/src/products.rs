use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockwatch_catalog::onboarding::{NewProductRequest, OnboardingService};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/products", post(create_product))
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub warehouse_id: Uuid,
    pub initial_quantity: i32,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreateProductResponse {
    pub message: &'static str,
    pub product_id: Uuid,
}

/// POST /products
/// Onboards a product together with its initial stock in one transaction.
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<CreateProductResponse>), AppError> {
    let service = OnboardingService::new(state.catalog.clone(), state.onboarding.clone());

    let product_id = service
        .create_product(NewProductRequest {
            name: req.name,
            sku: req.sku,
            price: req.price,
            warehouse_id: req.warehouse_id,
            initial_quantity: req.initial_quantity,
            supplier_id: req.supplier_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateProductResponse {
            message: "Product created",
            product_id,
        }),
    ))
}
