//! Check routes: listing, lifecycle transitions, alerts, supplier checks.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use cuentas_core::checks::CheckAdminUpdate;
use cuentas_db::repositories::{CheckFilter, IssueSupplierCheckInput};
use cuentas_shared::types::CheckId;

use crate::{AppState, error::ApiResult, extractors::Actor};

/// Creates the check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checks", get(list_checks))
        .route("/checks/alerts", get(pending_alerts))
        .route("/checks/supplier", post(issue_supplier_check))
        .route("/checks/{check_id}", get(get_check).patch(update_check))
        .route("/checks/{check_id}/clear", post(clear_check))
        .route("/checks/{check_id}/bounce", post(bounce_check))
        .route("/checks/{check_id}/void", post(void_check))
}

/// Request body for clearing a check.
#[derive(Debug, Default, Deserialize)]
pub struct ClearRequest {
    /// Clearing date, today when omitted.
    pub cleared_on: Option<NaiveDate>,
}

/// Request body for bouncing a check.
#[derive(Debug, Default, Deserialize)]
pub struct BounceRequest {
    /// Bank's reason, if given.
    pub reason: Option<String>,
}

/// Request body for voiding a check.
#[derive(Debug, Deserialize)]
pub struct VoidRequest {
    /// Why the check is voided. Required.
    pub reason: String,
}

/// Query parameters for the alert listing.
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Window for `due_soon`; the configured default when omitted.
    pub warning_days: Option<u32>,
    /// Reference date, today when omitted.
    pub today: Option<NaiveDate>,
}

async fn list_checks(
    State(state): State<AppState>,
    Query(filter): Query<CheckFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.checks().list(&filter).await?))
}

async fn get_check(
    State(state): State<AppState>,
    Path(check_id): Path<CheckId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.checks().get(check_id).await?))
}

async fn update_check(
    State(state): State<AppState>,
    Path(check_id): Path<CheckId>,
    Json(update): Json<CheckAdminUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.checks().update_admin_fields(check_id, update).await?,
    ))
}

/// Clears a check. The body is optional.
async fn clear_check(
    State(state): State<AppState>,
    Path(check_id): Path<CheckId>,
    actor: Actor,
    body: Option<Json<ClearRequest>>,
) -> ApiResult<impl IntoResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let cleared = state
        .checks()
        .mark_cleared(check_id, request.cleared_on, actor.user_id())
        .await?;
    Ok(Json(cleared))
}

async fn bounce_check(
    State(state): State<AppState>,
    Path(check_id): Path<CheckId>,
    body: Option<Json<BounceRequest>>,
) -> ApiResult<impl IntoResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    Ok(Json(
        state.checks().mark_bounced(check_id, request.reason).await?,
    ))
}

async fn void_check(
    State(state): State<AppState>,
    Path(check_id): Path<CheckId>,
    Json(request): Json<VoidRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.checks().mark_voided(check_id, request.reason).await?,
    ))
}

/// Pending checks in both directions, ordered by due date, with alert levels.
async fn pending_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> ApiResult<impl IntoResponse> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let alerts = state
        .checks()
        .pending_with_alerts(today, query.warning_days)
        .await?;
    Ok(Json(alerts))
}

async fn issue_supplier_check(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<IssueSupplierCheckInput>,
) -> ApiResult<impl IntoResponse> {
    let check = state
        .checks()
        .issue_supplier_check(input, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(check)))
}
