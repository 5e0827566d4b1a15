//! Exa API Client
//!
//! Searches the web for recent documents and returns their text content.
//!
//! ## Request shape
//!
//! `POST {base_url}/search` with the key in the `x-api-key` header. The
//! recency window is sent as `startPublishedDate` (a calendar date), and the
//! provider is asked for up to 5000 characters of plain text per document.
//! Previews are cut down locally to the caller's `max_preview_chars`.

use crate::config::SearchConfig;
use crate::search::SearchProvider;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Appended to a preview when it was cut short
pub const ELLIPSIS: &str = "...";

const FETCH_MAX_CHARACTERS: usize = 5000;

/// Errors that can occur during search operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    #[error("No Exa API key available. Please provide an API key or set the EXA_API_KEY environment variable.")]
    NoApiKey,

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Error performing search: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

/// A single normalized search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub published_date: Option<String>,
    pub content_preview: Option<String>,
}

/// Parameters for one search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Only documents published on or after `today - days_back`
    pub days_back: u32,
    pub max_results: usize,
    pub max_preview_chars: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            days_back: 7,
            max_results: 5,
            max_preview_chars: 500,
        }
    }

    pub fn with_days_back(mut self, days: u32) -> Self {
        self.days_back = days;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn with_max_preview_chars(mut self, max: usize) -> Self {
        self.max_preview_chars = max;
        self
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidRequest("query is empty".to_string()));
        }
        if self.max_results == 0 {
            return Err(SearchError::InvalidRequest("max_results must be positive".to_string()));
        }
        if self.max_preview_chars == 0 {
            return Err(SearchError::InvalidRequest(
                "max_preview_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a search call, successful or not
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub error_message: Option<String>,
    pub results: Vec<SearchResult>,
    pub query: String,
    pub total_found: usize,
    #[serde(skip)]
    pub error: Option<SearchError>,
}

impl SearchResponse {
    pub fn ok(query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            success: true,
            error_message: None,
            total_found: results.len(),
            results,
            query: query.into(),
            error: None,
        }
    }

    pub fn failed(query: impl Into<String>, error: SearchError) -> Self {
        Self {
            success: false,
            error_message: Some(error.to_string()),
            results: Vec::new(),
            query: query.into(),
            total_found: 0,
            error: Some(error),
        }
    }
}

// Wire types for the Exa API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    use_autoprompt: bool,
    start_published_date: String,
    num_results: usize,
    contents: ExaContents,
}

#[derive(Serialize)]
struct ExaContents {
    text: ExaTextOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextOptions {
    include_html_tags: bool,
    max_characters: usize,
}

#[derive(Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Exa search client
pub struct ExaClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ExaClient {
    /// Create a client. A missing key is not an error here; searches will
    /// report it as a failed response.
    pub fn new(api_key: Option<String>, config: &SearchConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn execute(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::NoApiKey)?;
        request.validate()?;

        let body = ExaSearchRequest {
            query: &request.query,
            use_autoprompt: true,
            start_published_date: start_published_date(Utc::now(), request.days_back)?,
            num_results: request.max_results,
            contents: ExaContents {
                text: ExaTextOptions {
                    include_html_tags: false,
                    max_characters: FETCH_MAX_CHARACTERS,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail: String = error_text.chars().take(400).collect();
            return Err(SearchError::RequestFailed(format!(
                "Exa API error ({}): {}",
                status, detail
            )));
        }

        let parsed: ExaSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!(raw_count = parsed.results.len(), "Raw Exa response received");

        let results = parsed
            .results
            .into_iter()
            .take(request.max_results)
            .map(|r| SearchResult {
                title: r
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "Untitled".to_string()),
                url: r.url,
                published_date: r.published_date,
                content_preview: r
                    .text
                    .filter(|t| !t.is_empty())
                    .map(|t| truncate_preview(&t, request.max_preview_chars)),
            })
            .collect();

        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for ExaClient {
    async fn search(&self, request: &SearchRequest) -> SearchResponse {
        info!(query = %request.query, days_back = request.days_back, "Searching via Exa");

        match self.execute(request).await {
            Ok(results) => {
                info!(count = results.len(), "Search completed");
                SearchResponse::ok(request.query.clone(), results)
            }
            Err(e) => {
                warn!(error = %e, query = %request.query, "Search failed");
                SearchResponse::failed(request.query.clone(), e)
            }
        }
    }
}

/// Earliest publish date for a window of `days_back` days ending at `now`
pub fn start_published_date(now: DateTime<Utc>, days_back: u32) -> Result<String, SearchError> {
    chrono::Duration::try_days(i64::from(days_back))
        .and_then(|window| now.checked_sub_signed(window))
        .map(|start| start.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            SearchError::InvalidRequest(format!(
                "days_back {} reaches past the earliest supported date",
                days_back
            ))
        })
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `ELLIPSIS`
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}
