//! Web search exposed as a model-callable tool

use crate::llm::tools::Tool;
use crate::search::{SearchProvider, SearchRequest, SearchResponse, SearchError};
use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const TOOL_NAME: &str = "web_search_tool";

/// Arguments the model may pass to the search tool
#[derive(Debug, Deserialize)]
struct WebSearchInput {
    search_query: String,
    #[serde(default = "default_days_ago")]
    days_ago: u32,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default = "default_max_preview_chars")]
    max_preview_chars: usize,
}

fn default_days_ago() -> u32 {
    7
}

fn default_max_results() -> usize {
    5
}

fn default_max_preview_chars() -> usize {
    500
}

pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "Searches the web based on a search query for recent results. \
                Returns both the search results and the contents of those pages. \
                Particularly useful for finding recent developments and news."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "search_query": {
                        "type": "string",
                        "description": "The search query to use"
                    },
                    "days_ago": {
                        "type": "integer",
                        "description": "How many days back to search for content",
                        "default": 7
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results to return",
                        "default": 5
                    },
                    "max_preview_chars": {
                        "type": "integer",
                        "description": "Maximum characters for content previews",
                        "default": 500
                    }
                },
                "required": ["search_query"]
            }),
        }
    }

    async fn call(&self, arguments: &str) -> Value {
        let input: WebSearchInput = match serde_json::from_str(arguments) {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "Model sent malformed search arguments");
                let response = SearchResponse::failed(
                    "",
                    SearchError::InvalidRequest(format!("malformed arguments: {}", e)),
                );
                return json!(response);
            }
        };

        info!(query = %input.search_query, "Model requested a web search");

        let request = SearchRequest::new(input.search_query)
            .with_days_back(input.days_ago)
            .with_max_results(input.max_results)
            .with_max_preview_chars(input.max_preview_chars);

        json!(self.provider.search(&request).await)
    }
}
