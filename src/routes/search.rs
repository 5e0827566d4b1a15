use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use crate::models::{AppState, SearchApiRequest};
use crate::routes::error_response;
use crate::search::{ExaClient, SearchProvider, SearchRequest};
use crate::types::AppError;
use tracing::info;
use validator::Validate;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(manual_search))
        .with_state(state)
}

/// POST /api/search - Run one Exa search and return the raw response
///
/// Search failures are reported in the body with `success: false`, matching
/// what the pipeline's tool sees.
async fn manual_search(
    State(state): State<AppState>,
    Json(request): Json<SearchApiRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(&AppError::InvalidRequest(e.to_string()));
    }

    let api_key = request
        .exa_api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.search.active_api_key());

    let client = match ExaClient::new(api_key, &state.config.search) {
        Ok(client) => client,
        Err(e) => return error_response(&e),
    };

    let search_request = SearchRequest::new(request.query.trim())
        .with_days_back(request.days_back.unwrap_or(7))
        .with_max_results(request.max_results.unwrap_or(state.config.search.max_results))
        .with_max_preview_chars(state.config.search.max_preview_chars);

    info!(query = %search_request.query, "Manual search requested");
    let response = client.search(&search_request).await;

    (StatusCode::OK, Json(response)).into_response()
}
