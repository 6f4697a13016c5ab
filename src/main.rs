use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, DEFAULT_REST_ADDR, core_config_from_env, router};
use femr_core::ReportService;

/// Main entry point for the fEMR report service
///
/// Loads `.env`, resolves the core configuration once and serves the REST API (with Swagger UI
/// under `/swagger-ui`).
///
/// # Environment Variables
/// - `FEMR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FEMR_DATA_DIR`: Directory holding per-encounter YAML files (default: "encounter_data")
/// - `FEMR_FETCH_TIMEOUT_SECS`: Report generation timeout in seconds (default: 10)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("femr_run=info".parse()?)
                .add_directive("femr_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("FEMR_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = Arc::new(core_config_from_env()?);

    tracing::info!("++ Starting fEMR REST on {}", rest_addr);
    tracing::info!("++ Reading encounters from {}", cfg.data_dir().display());

    let app = router(AppState::new(ReportService::with_yaml_store(cfg)));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
