//! Sale routes: creation, payments, and reconciliation.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use cuentas_db::repositories::{CreateSaleInput, RecordPaymentInput, SaleFilter};
use cuentas_shared::types::SaleId;

use crate::{AppState, error::ApiResult, extractors::Actor};

/// Creates the sale routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{sale_id}", get(get_sale))
        .route("/sales/{sale_id}/payments", post(record_payment))
        .route("/sales/{sale_id}/reconciliation", get(get_reconciliation))
}

async fn list_sales(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.sales().list(&filter).await?))
}

/// Creates a sale with its lines and initial payments in one transaction.
async fn create_sale(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<CreateSaleInput>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.sales().create_sale(input, actor.user_id()).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.sales().get(sale_id).await?))
}

async fn record_payment(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
    actor: Actor,
    Json(input): Json<RecordPaymentInput>,
) -> ApiResult<impl IntoResponse> {
    let recorded = state
        .sales()
        .record_payment(sale_id, input, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

async fn get_reconciliation(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.sales().reconcile(sale_id).await?))
}
