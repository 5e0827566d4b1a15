// Oxidized Newsletter - research-to-newsletter pipeline over web search and LLM completions

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // Exa web search and the model-callable search tool
pub mod routes;
pub mod middleware;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use agents::{NewsletterPipeline, PipelineResult, PipelineState};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
