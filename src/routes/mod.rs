//! API Routes
//!
//! HTTP endpoints for the newsletter generator:
//! - `/` - Single-page front end
//! - `/api/newsletter` - Run the four-stage pipeline for a topic
//! - `/api/models` - Known completion models and key availability
//! - `/api/search` - One-off web search
//! - `/api/health` - Health check

pub mod health;
pub mod newsletter;
pub mod search;
pub mod ui;

use crate::middleware::apply_cors;
use crate::models::{AppState, ErrorResponse, RETRY_HINT};
use crate::types::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(newsletter::router(state.clone()))
        .merge(search::router(state))
        .merge(health::router())
        .merge(ui::router());

    apply_cors(router, &origins).layer(TraceLayer::new_for_http())
}

/// JSON error body with the status for `err`
pub(crate) fn error_response(err: &AppError) -> Response {
    let status = err.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(kind = err.kind(), error = %err, "Request failed");
    } else {
        warn!(kind = err.kind(), error = %err, "Request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.kind().to_string(),
            details: err.to_string(),
            hint: RETRY_HINT.to_string(),
        }),
    )
        .into_response()
}
