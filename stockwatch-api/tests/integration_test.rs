use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use stockwatch_api::{app, AppState};
use stockwatch_core::{CatalogStore, NewProduct, OnboardingStore, StockLedger};
use stockwatch_store::MemoryStore;

fn test_app(store: &MemoryStore) -> Router {
    app(AppState {
        catalog: Arc::new(store.clone()),
        ledger: Arc::new(store.clone()),
        onboarding: Arc::new(store.clone()),
        lookback_days: 30,
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections (e.g. a malformed UUID) come back as plain text.
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn post_products(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/products")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_alerts(company_id: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/companies/{company_id}/alerts/low-stock"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn create_product_returns_201_and_writes_inventory() {
    let store = MemoryStore::new();
    let company = store.add_company("Acme").await;
    let warehouse = store.add_warehouse(company.id, "Main").await;
    let router = test_app(&store);

    let (status, body) = send(
        &router,
        post_products(json!({
            "name": "Widget",
            "sku": "WID-1",
            "price": "19.99",
            "warehouse_id": warehouse.id,
            "initial_quantity": 25
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Product created");

    let product_id: Uuid = serde_json::from_value(body["product_id"].clone()).unwrap();
    let product = store.product(product_id).await.unwrap().unwrap();
    assert_eq!(product.sku, "WID-1");
    assert_eq!(product.price, Decimal::new(1999, 2));

    let inventory = store
        .inventory(product_id, warehouse.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inventory.quantity, 25);
}

#[tokio::test]
async fn duplicate_sku_returns_400_naming_the_sku_field() {
    let store = MemoryStore::new();
    let company = store.add_company("Acme").await;
    let warehouse = store.add_warehouse(company.id, "Main").await;
    let router = test_app(&store);

    let request_body = json!({
        "name": "Widget",
        "sku": "WID-1",
        "price": "19.99",
        "warehouse_id": warehouse.id,
        "initial_quantity": 25
    });

    let (status, first) = send(&router, post_products(request_body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let original_id: Uuid = serde_json::from_value(first["product_id"].clone()).unwrap();

    let (status, body) = send(&router, post_products(request_body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["sku"], json!(["SKU must be unique."]));

    // No second row was written.
    let existing = store.product_by_sku("WID-1").await.unwrap().unwrap();
    assert_eq!(existing.id, original_id);
}

#[tokio::test]
async fn validation_failures_are_reported_together() {
    let store = MemoryStore::new();
    let router = test_app(&store);

    let (status, body) = send(
        &router,
        post_products(json!({
            "name": "",
            "sku": "",
            "price": "-1.00",
            "warehouse_id": Uuid::new_v4(),
            "initial_quantity": -5
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["name", "sku", "price", "initial_quantity", "warehouse_id"] {
        assert!(body.get(field).is_some(), "missing error for {field}: {body}");
    }
}

#[tokio::test]
async fn unknown_supplier_is_a_field_error() {
    let store = MemoryStore::new();
    let company = store.add_company("Acme").await;
    let warehouse = store.add_warehouse(company.id, "Main").await;
    let router = test_app(&store);

    let (status, body) = send(
        &router,
        post_products(json!({
            "name": "Widget",
            "sku": "WID-9",
            "price": "5.00",
            "warehouse_id": warehouse.id,
            "initial_quantity": 1,
            "supplier_id": Uuid::new_v4()
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["supplier_id"], json!(["Supplier not found."]));
}

#[tokio::test]
async fn store_failure_returns_500_with_generic_error() {
    let store = MemoryStore::new();
    let company = store.add_company("Acme").await;
    let warehouse = store.add_warehouse(company.id, "Main").await;
    store.fail_next_inventory_insert();
    let router = test_app(&store);

    let (status, body) = send(
        &router,
        post_products(json!({
            "name": "Widget",
            "sku": "WID-5",
            "price": "5.00",
            "warehouse_id": warehouse.id,
            "initial_quantity": 1
        })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
    // The whole onboarding rolled back.
    assert!(store.product_by_sku("WID-5").await.unwrap().is_none());
}

#[tokio::test]
async fn company_without_warehouses_gets_empty_alert_list() {
    let store = MemoryStore::new();
    let router = test_app(&store);

    let (status, body) = send(&router, get_alerts(&Uuid::new_v4().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "alerts": [], "total_alerts": 0 }));
}

#[tokio::test]
async fn low_stock_alert_carries_projection_and_supplier() {
    let store = MemoryStore::new();
    let company = store.add_company("Acme").await;
    let warehouse = store.add_warehouse(company.id, "Main").await;
    let supplier = store.add_supplier("Parts Co", "parts@example.com").await;

    let product_id = store
        .insert_product_with_stock(
            NewProduct {
                name: "Widget".into(),
                sku: "WID-1".into(),
                price: Decimal::new(1999, 2),
                supplier_id: Some(supplier.id),
                low_stock_threshold: 60,
            },
            warehouse.id,
            50,
        )
        .await
        .unwrap();
    let inventory = store
        .inventory(product_id, warehouse.id)
        .await
        .unwrap()
        .unwrap();
    store
        .record_change_at(
            inventory.id,
            -30,
            Some("sale"),
            Utc::now() - Duration::days(10),
        )
        .await;

    let router = test_app(&store);
    let (status, body) = send(&router, get_alerts(&company.id.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_alerts"], 1);
    let alert = &body["alerts"][0];
    assert_eq!(alert["sku"], "WID-1");
    assert_eq!(alert["current_stock"], 50);
    assert_eq!(alert["threshold"], 60);
    assert_eq!(alert["days_until_stockout"], 50);
    assert_eq!(alert["warehouse_name"], "Main");
    assert_eq!(alert["supplier"]["name"], "Parts Co");
    assert_eq!(alert["supplier"]["contact_email"], "parts@example.com");
}

#[tokio::test]
async fn alert_feed_is_idempotent_without_writes() {
    let store = MemoryStore::new();
    let company = store.add_company("Acme").await;
    let warehouse = store.add_warehouse(company.id, "Main").await;

    let product_id = store
        .insert_product_with_stock(
            NewProduct {
                name: "Widget".into(),
                sku: "WID-1".into(),
                price: Decimal::new(500, 2),
                supplier_id: None,
                low_stock_threshold: 10,
            },
            warehouse.id,
            3,
        )
        .await
        .unwrap();
    let inventory = store
        .inventory(product_id, warehouse.id)
        .await
        .unwrap()
        .unwrap();
    store
        .record_change_at(inventory.id, -5, None, Utc::now() - Duration::days(1))
        .await;

    let router = test_app(&store);
    let (first_status, first) = send(&router, get_alerts(&company.id.to_string())).await;
    let (second_status, second) = send(&router, get_alerts(&company.id.to_string())).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["total_alerts"], 1);
}

#[tokio::test]
async fn non_uuid_company_id_is_a_bad_request() {
    let store = MemoryStore::new();
    let router = test_app(&store);

    let (status, _) = send(&router, get_alerts("not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
