//! Agent System
//!
//! The newsletter is produced by four role-played stages:
//!
//! - **Researcher**: organizes fresh search results into sourced research
//! - **Insights Expert**: verifies and expands the research with analysis
//! - **Writer**: turns the insights into newsletter prose
//! - **Editor**: proofreads and formats the draft for publication
//!
//! ## Pipeline Overview
//!
//! ```text
//!    Topic
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Search    │  → Two recency-windowed Exa queries
//! └─────────────┘
//!      │ context
//!      ▼
//! ┌─────────────┐
//! │ Researcher  │  → research   (may call web_search_tool)
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Insights   │  → insights   (may call web_search_tool)
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Writer    │  → draft
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Editor    │  → final
//! └─────────────┘
//! ```

pub mod context;
pub mod pipeline;
pub mod prompt;
pub mod roles;

pub use pipeline::{
    NewsletterPipeline, PipelineCredentials, PipelineResult, PipelineSettings, PipelineState,
    StageRequest,
};
pub use prompt::{StagePromptBuilder, SystemPromptBuilder};
pub use roles::StageRole;

use crate::config::Config;
use crate::types::AppResult;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Build the clients from `config` and `credentials` and run one newsletter
pub async fn execute_newsletter_pipeline(
    run_id: Uuid,
    topic: &str,
    model: Option<&str>,
    credentials: &PipelineCredentials,
    config: &Config,
) -> AppResult<PipelineResult> {
    let pipeline = NewsletterPipeline::from_config(config, model, credentials)?;
    info!(%run_id, topic_len = topic.len(), model = pipeline.model(), "Starting newsletter pipeline");

    let started = Instant::now();
    let result = pipeline.run_identified(run_id, topic, |_| {}).await?;

    info!(
        %run_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        final_len = result.final_text.len(),
        "Newsletter pipeline complete"
    );

    Ok(result)
}
