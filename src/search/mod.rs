//! Search Module
//!
//! Web search for the newsletter pipeline, backed by the Exa API:
//! - `ExaClient`: recency-windowed search returning trimmed content previews
//! - `WebSearchTool`: exposes a search provider as a model-callable tool
//!
//! Every search call is a single best-effort attempt. Failures come back as a
//! `SearchResponse` with `success == false` instead of an error, so callers
//! can decide whether a missing result set is fatal.

pub mod exa;
pub mod tool;

pub use exa::{ExaClient, SearchError, SearchRequest, SearchResponse, SearchResult, ELLIPSIS};
pub use tool::WebSearchTool;

use async_trait::async_trait;

/// A remote search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> SearchResponse;
}
