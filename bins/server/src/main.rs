//! Cuentas API server.
//!
//! Main entry point for the back-office ledger service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cuentas_api::{AppState, create_router};
use cuentas_core::LedgerContext;
use cuentas_db::{PaymentMethodRepository, connect_with_pool};
use cuentas_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuentas=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Special methods are resolved by kind once, here.
    let registry = PaymentMethodRepository::new(db.clone())
        .load_registry()
        .await
        .context("failed to load payment methods")?;
    if registry.is_empty() {
        tracing::warn!("no payment methods configured; run the migrator to seed them");
    }
    info!(payment_methods = registry.len(), "Payment methods loaded");

    let ctx = LedgerContext::new(
        registry,
        Duration::from_millis(config.ledger.lock_timeout_ms),
        config.ledger.check_warning_days,
    );
    info!(
        lock_timeout_ms = config.ledger.lock_timeout_ms,
        check_warning_days = config.ledger.check_warning_days,
        "Ledger context ready"
    );

    let app = create_router(AppState::new(db, ctx));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
