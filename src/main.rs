//! video-analytics-gateway server entry point.
//!
//! Wires the model client, the database executor and the access guard into
//! the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use video_analytics_gateway::api;
use video_analytics_gateway::app_state::AppState;
use video_analytics_gateway::config::GatewayConfig;
use video_analytics_gateway::domain::{AccessGuard, VIDEO_ANALYTICS};
use video_analytics_gateway::llm::GeminiClient;
use video_analytics_gateway::persistence::PostgresExecutor;
use video_analytics_gateway::service::AnalyticsService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, model = %config.llm_model, "starting video-analytics-gateway");

    // Database
    let executor = PostgresExecutor::connect_lazy(
        &config.database_url,
        config.database_max_connections,
        config.database_min_connections,
        config.connect_timeout(),
        config.query_timeout(),
    )?;
    if config.run_migrations {
        executor.migrate().await?;
        tracing::info!("migrations applied");
    }
    match executor.missing_columns(&VIDEO_ANALYTICS).await {
        Ok(missing) if missing.is_empty() => {}
        Ok(missing) => tracing::warn!(?missing, "store lacks columns the prompt describes"),
        Err(e) => tracing::warn!(error = %e, "schema check skipped"),
    }

    // Build service layer
    let generator = GeminiClient::new(config.llm_settings())?;
    tracing::info!(endpoint = %generator.endpoint(), "model client ready");
    let analytics_service = Arc::new(AnalyticsService::new(
        VIDEO_ANALYTICS,
        Arc::new(generator),
        Arc::new(executor),
    ));
    let access_guard = Arc::new(AccessGuard::new(
        config.allowed_requesters.clone(),
        config.requester_min_interval(),
        config.requester_cache_capacity,
    ));

    // Build application state
    let app_state = AppState {
        analytics_service,
        access_guard,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
