//! Zenbali Service - HTTP API for the events marketplace
//!
//! This is the main entry point for the zenbali service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zenbali_service::{create_router, AppState, ServiceConfig};
use zenbali_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zenbali=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Zenbali Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        database_configured = %config.database_url.is_some(),
        stripe_configured = %config.has_stripe(),
        webhook_secret_configured = %config.stripe_webhook_secret.is_some(),
        upload_dir = %config.upload_dir.display(),
        "Service configuration loaded"
    );

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            tracing::info!(max_connections = config.db_max_connections, "Connecting to PostgreSQL");
            let store = PgStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            tracing::info!("Database migrations applied");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set - using the in-memory store, data will not persist");
            Arc::new(MemoryStore::with_reference_data())
        }
    };

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
