//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the report REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `femr-run` binary serves the same
//! router and also loads a `.env` file.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState, DEFAULT_REST_ADDR};
use femr_core::ReportService;

/// Main entry point for the fEMR REST API server
///
/// # Environment Variables
/// - `FEMR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `FEMR_DATA_DIR`: Encounter data directory (default: "encounter_data")
/// - `FEMR_FETCH_TIMEOUT_SECS`: Report generation timeout (default: 10)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FEMR_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!("-- Starting fEMR REST API on {}", addr);

    let cfg = Arc::new(core_config_from_env()?);
    tracing::info!("-- Reading encounters from {}", cfg.data_dir().display());

    let app = router(AppState::new(ReportService::with_yaml_store(cfg)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
