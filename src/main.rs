pub mod api;
pub mod config;
pub mod error;
pub mod state;

use crate::state::AppState;
use anyhow::Context;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockpredict=info,stockpredict_server=info,tower_http=info".into()),
        )
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting stockpredict-server");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        data_dir = %app_config.service.data_dir.display(),
        script = %app_config.service.script_path.display(),
        "Loaded configuration"
    );

    let app_state = AppState::from_config(app_config.service.clone())?;
    tracing::info!(predictor = app_state.bridge.predictor_name(), "Prediction bridge ready");

    let mut app = api::router(app_state).layer(TraceLayer::new_for_http());
    if app_config.cors_allow_any {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
