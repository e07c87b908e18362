//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod catalog;
pub mod checks;
pub mod customers;
pub mod health;
pub mod sales;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(catalog::routes())
        .merge(customers::routes())
        .merge(sales::routes())
        .merge(checks::routes())
}
