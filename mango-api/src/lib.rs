//! mango-api library interface
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use services::AnalysisOrchestrator;
use std::sync::Arc;

/// Application state shared across handlers
///
/// Everything in here is constructed once at startup and read-only for
/// the process lifetime; per-request data never lands in state.
#[derive(Clone)]
pub struct AppState {
    /// Analysis pipeline with its injected collaborators
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: AnalysisOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::prescription_routes())
        .merge(api::health_routes())
        .with_state(state)
}
