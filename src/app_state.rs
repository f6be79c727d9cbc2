//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::AccessGuard;
use crate::service::AnalyticsService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Question → answer pipeline.
    pub analytics_service: Arc<AnalyticsService>,
    /// Allow-list and per-requester throttle.
    pub access_guard: Arc<AccessGuard>,
}
