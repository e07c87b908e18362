//! Customer, balance, statement, account-payment, and adjustment routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use cuentas_core::catalog::{CustomerUpdate, NewCustomer};
use cuentas_db::repositories::{
    AdjustmentInput, CustomerFilter, CustomerPaymentInput, EntryFilter,
};
use cuentas_shared::types::CustomerId;

use crate::{AppState, error::ApiResult, extractors::Actor};

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{customer_id}",
            get(get_customer).patch(update_customer),
        )
        .route("/customers/{customer_id}/balance", get(get_balance))
        .route("/customers/{customer_id}/statement", get(get_statement))
        .route("/customers/{customer_id}/outstanding", get(get_outstanding))
        .route("/customers/{customer_id}/entries", get(list_entries))
        .route(
            "/customers/{customer_id}/payments",
            post(allocate_payment),
        )
        .route(
            "/customers/{customer_id}/adjustments",
            post(record_adjustment),
        )
}

/// Query parameters for a statement.
#[derive(Debug, Deserialize)]
pub struct StatementQuery {
    /// First day included (YYYY-MM-DD). Earlier entries fold into the opening balance.
    pub date_from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD).
    pub date_to: Option<NaiveDate>,
}

async fn list_customers(
    State(state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.customers().list(&filter).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<NewCustomer>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.customers().create(input).await?;
    info!(customer_id = %customer.id, credit_limit = %customer.credit_limit, "customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.customers().get(customer_id).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Json(update): Json<CustomerUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.customers().update(customer_id, update).await?))
}

async fn get_balance(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ledger().balance_of(customer_id).await?))
}

async fn get_statement(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Query(query): Query<StatementQuery>,
) -> ApiResult<impl IntoResponse> {
    let statement = state
        .ledger()
        .statement(customer_id, query.date_from, query.date_to)
        .await?;
    Ok(Json(statement))
}

async fn get_outstanding(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ledger().outstanding_by_sale(customer_id).await?))
}

async fn list_entries(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Query(filter): Query<EntryFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ledger().entries(customer_id, &filter).await?))
}

/// Pays on account: FIFO over the customer's sales, surplus credited.
async fn allocate_payment(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    actor: Actor,
    Json(input): Json<CustomerPaymentInput>,
) -> ApiResult<impl IntoResponse> {
    let result = state
        .allocation()
        .allocate_customer_payment(customer_id, input, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Corrects the account with a signed `adjustment` entry.
async fn record_adjustment(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    actor: Actor,
    Json(input): Json<AdjustmentInput>,
) -> ApiResult<impl IntoResponse> {
    let recorded = state
        .allocation()
        .record_adjustment(customer_id, input, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}
