use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use stockwatch_core::model::DEFAULT_LOW_STOCK_THRESHOLD;
use stockwatch_core::{CatalogStore, NewProduct, OnboardingStore, StoreError};

/// Per-field validation messages, keyed by request field name. A BTreeMap
/// keeps the serialized error body deterministic.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductRequest {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub warehouse_id: Uuid,
    pub initial_quantity: i32,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// One or more request fields failed validation. All violations are
    /// collected so the caller can show every error at once.
    #[error("validation failed")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates a new-product request and creates the product together with
/// its initial inventory row in one transaction.
pub struct OnboardingService {
    catalog: Arc<dyn CatalogStore>,
    store: Arc<dyn OnboardingStore>,
}

impl OnboardingService {
    pub fn new(catalog: Arc<dyn CatalogStore>, store: Arc<dyn OnboardingStore>) -> Self {
        Self { catalog, store }
    }

    /// Creates the product and returns its id. Validation runs before any
    /// write; the insert itself is all-or-nothing. The pre-checks on sku,
    /// warehouse and supplier are advisory: a concurrent duplicate that
    /// slips past them is caught by the store's unique indexes and reported
    /// in the same field-error shape.
    pub async fn create_product(
        &self,
        req: NewProductRequest,
    ) -> Result<Uuid, OnboardingError> {
        let mut errors = FieldErrors::new();

        validate_length(&mut errors, "name", &req.name, 100);
        validate_length(&mut errors, "sku", &req.sku, 50);

        if req.price < Decimal::ZERO {
            push(&mut errors, "price", "Ensure this value is greater than or equal to 0.");
        }
        if req.price.normalize().scale() > 2 {
            push(
                &mut errors,
                "price",
                "Ensure that there are no more than 2 decimal places.",
            );
        }
        if req.initial_quantity < 0 {
            push(
                &mut errors,
                "initial_quantity",
                "Ensure this value is greater than or equal to 0.",
            );
        }

        // Existence checks, each reported independently.
        if !req.sku.is_empty() && self.catalog.product_by_sku(&req.sku).await?.is_some() {
            push(&mut errors, "sku", "SKU must be unique.");
        }
        if self.catalog.warehouse(req.warehouse_id).await?.is_none() {
            push(&mut errors, "warehouse_id", "Warehouse not found.");
        }
        if let Some(supplier_id) = req.supplier_id {
            if self.catalog.supplier(supplier_id).await?.is_none() {
                push(&mut errors, "supplier_id", "Supplier not found.");
            }
        }

        if !errors.is_empty() {
            return Err(OnboardingError::Invalid(errors));
        }

        let product = NewProduct {
            name: req.name,
            sku: req.sku.clone(),
            price: req.price,
            supplier_id: req.supplier_id,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        };

        match self
            .store
            .insert_product_with_stock(product, req.warehouse_id, req.initial_quantity)
            .await
        {
            Ok(product_id) => {
                tracing::info!(%product_id, sku = %req.sku, "product onboarded");
                Ok(product_id)
            }
            // Lost a uniqueness race after the pre-check passed. The
            // transaction has rolled back; report it as the sku field error
            // rather than leaking a storage error.
            Err(StoreError::Conflict(detail)) => {
                tracing::warn!(sku = %req.sku, %detail, "onboarding conflict");
                let mut errors = FieldErrors::new();
                push(&mut errors, "sku", "SKU must be unique.");
                Err(OnboardingError::Invalid(errors))
            }
            Err(other) => Err(OnboardingError::Store(other)),
        }
    }
}

fn validate_length(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.trim().is_empty() {
        push(errors, field, "This field may not be blank.");
    } else if value.chars().count() > max {
        push(
            errors,
            field,
            &format!("Ensure this field has no more than {max} characters."),
        );
    }
}

fn push(errors: &mut FieldErrors, field: &'static str, message: &str) {
    errors.entry(field).or_default().push(message.to_string());
}
