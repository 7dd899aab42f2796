//! services/dashboard/src/bin/dashboard.rs

use dashboard_lib::{
    adapters::{ApiAdapter, DbAdapter, MongoStore},
    config::Config,
    error::DashboardError,
    web::{router, AppState},
};
use practice_diff_core::reconcile::Reconciler;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(?config, "Configuration loaded. Starting dashboard...");

    // --- 2. Connect to the Document Store (once per process) ---
    info!("Connecting to document store...");
    let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    if let Err(e) = store.ping().await {
        // Keep serving; reads answer 502 until the store comes back.
        warn!(error = %e, "Document store did not answer ping");
    }
    let db_adapter = Arc::new(DbAdapter::new(Arc::new(store.clone())));

    // --- 3. Initialize the API Adapter with one pooled client ---
    let http = ApiAdapter::build_client(config.http_timeout)?;
    let api_adapter = Arc::new(ApiAdapter::new(
        http,
        config.api_host.clone(),
        config.api_login_password.clone(),
        db_adapter.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        reconciler: Reconciler::new(db_adapter.clone(), db_adapter, api_adapter),
    });
    let app = router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- 6. Release the Store Client ---
    store.shutdown().await;
    info!("Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
