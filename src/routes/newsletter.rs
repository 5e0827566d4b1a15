use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use crate::agents::execute_newsletter_pipeline;
use crate::llm::openai::models;
use crate::models::{AppState, ModelInfo, ModelsResponse, NewsletterRequest, NewsletterResponse};
use crate::routes::error_response;
use crate::types::AppError;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/newsletter", post(generate_newsletter))
        .route("/api/models", get(list_models))
        .with_state(state)
}

/// POST /api/newsletter - Run one pipeline for the requested topic
async fn generate_newsletter(
    State(state): State<AppState>,
    Json(request): Json<NewsletterRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(&AppError::InvalidRequest(e.to_string()));
    }

    let run_id = Uuid::new_v4();
    let topic = request.topic.trim();
    info!(
        %run_id,
        topic = %topic,
        model = ?request.model,
        show_intermediate = request.show_intermediate,
        "Received newsletter request"
    );

    let started = Instant::now();
    let outcome = execute_newsletter_pipeline(
        run_id,
        topic,
        request.model.as_deref(),
        &request.credentials(),
        &state.config,
    )
    .await;

    match outcome {
        Ok(result) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let response = NewsletterResponse::from_result(
                run_id,
                topic,
                result,
                elapsed_ms,
                request.show_intermediate,
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/models - Selectable models and whether server-side keys exist
async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let default_model = state.config.llm.default_model.as_str();

    Json(ModelsResponse {
        models: models::KNOWN
            .iter()
            .map(|id| ModelInfo {
                id: id.to_string(),
                default: *id == default_model,
            })
            .collect(),
        openai_key_configured: state.config.llm.active_api_key().is_some(),
        exa_key_configured: state.config.search.active_api_key().is_some(),
    })
}
