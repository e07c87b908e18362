//! Products, suppliers, and payment methods.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use cuentas_core::catalog::{NewProduct, NewSupplier};
use cuentas_shared::types::{ProductId, SupplierId};

use crate::{AppState, error::ApiResult};

/// Creates the catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{product_id}", get(get_product))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/{supplier_id}", get(get_supplier))
        .route("/payment-methods", get(list_payment_methods))
}

/// Query parameters for listing products.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Only sellable products (default: false).
    #[serde(default)]
    pub active_only: bool,
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.products().list(query.active_only).await?))
}

async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> ApiResult<impl IntoResponse> {
    let product = state.products().create(input).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.products().get(product_id).await?))
}

async fn list_suppliers(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.suppliers().list().await?))
}

async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<NewSupplier>,
) -> ApiResult<impl IntoResponse> {
    let supplier = state.suppliers().create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<SupplierId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.suppliers().get(supplier_id).await?))
}

/// Lists every stored method, including inactive ones.
async fn list_payment_methods(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.payment_methods().list().await?))
}
