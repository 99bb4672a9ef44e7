//! HTTP Routes
//!
//! - `/` and `/search` - HTML search form and results table
//! - `/api/search` - JSON search endpoint
//! - `/api/health` - Health check

pub mod health;
pub mod search;
pub mod ui;

use axum::Router;
use crate::models::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(ui::router(state.clone()))
        .merge(search::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
}
