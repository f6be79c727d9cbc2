//! System endpoints: health check and schema catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// One column of a queryable table.
#[derive(Debug, Serialize, ToSchema)]
struct ColumnInfo {
    name: &'static str,
    sql_type: &'static str,
    description: &'static str,
}

/// A queryable table.
#[derive(Debug, Serialize, ToSchema)]
struct TableInfo {
    name: &'static str,
    description: &'static str,
    columns: Vec<ColumnInfo>,
}

/// `GET /config/schema`: Tables and columns questions can be asked about.
#[utoipa::path(
    get,
    path = "/config/schema",
    tag = "System",
    summary = "List queryable tables",
    description = "Returns the fixed two-table schema the gateway answers questions about.",
    responses(
        (status = 200, description = "Schema catalog", body = Vec<TableInfo>),
    )
)]
pub async fn schema_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tables: Vec<TableInfo> = state
        .analytics_service
        .contract()
        .tables
        .iter()
        .map(|t| TableInfo {
            name: t.name,
            description: t.description,
            columns: t
                .columns
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name,
                    sql_type: c.sql_type,
                    description: c.description,
                })
                .collect(),
        })
        .collect();
    (StatusCode::OK, Json(tables))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/schema", get(schema_handler))
}
