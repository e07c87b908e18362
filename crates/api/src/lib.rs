//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - The acting-user extractor
//! - JSON error responses built from `AppError`

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cuentas_core::LedgerContext;
use cuentas_db::{
    AllocationRepository, CheckRepository, CustomerRepository, LedgerRepository,
    PaymentMethodRepository, ProductRepository, SaleRepository, SupplierRepository,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Payment-method registry and ledger settings.
    pub ctx: LedgerContext,
}

impl AppState {
    /// Creates the state from a connection and a loaded context.
    #[must_use]
    pub fn new(db: DatabaseConnection, ctx: LedgerContext) -> Self {
        Self {
            db: Arc::new(db),
            ctx,
        }
    }

    fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }

    /// Customer repository.
    #[must_use]
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.conn(), self.ctx.clone())
    }

    /// Supplier repository.
    #[must_use]
    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.conn())
    }

    /// Product repository.
    #[must_use]
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.conn())
    }

    /// Payment method repository.
    #[must_use]
    pub fn payment_methods(&self) -> PaymentMethodRepository {
        PaymentMethodRepository::new(self.conn())
    }

    /// Ledger repository.
    #[must_use]
    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.conn())
    }

    /// Sale repository.
    #[must_use]
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.conn(), self.ctx.clone())
    }

    /// Check repository.
    #[must_use]
    pub fn checks(&self) -> CheckRepository {
        CheckRepository::new(self.conn(), self.ctx.clone())
    }

    /// Allocation repository.
    #[must_use]
    pub fn allocation(&self) -> AllocationRepository {
        AllocationRepository::new(self.conn(), self.ctx.clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
