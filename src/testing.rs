//! Test doubles shared by the unit tests

use crate::llm::LLMAdapter;
use crate::search::{SearchError, SearchProvider, SearchRequest, SearchResponse, SearchResult};
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, ToolCall};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Search provider answering from a fixed table and recording every request
#[derive(Default)]
pub struct CannedSearch {
    responses: HashMap<String, Result<Vec<SearchResult>, SearchError>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl CannedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.responses.insert(query.to_string(), Ok(results));
        self
    }

    pub fn fail(mut self, query: &str, error: SearchError) -> Self {
        self.responses.insert(query.to_string(), Err(error));
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, request: &SearchRequest) -> SearchResponse {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.get(&request.query) {
            Some(Ok(results)) => {
                let results = results.iter().take(request.max_results).cloned().collect();
                SearchResponse::ok(request.query.clone(), results)
            }
            Some(Err(e)) => SearchResponse::failed(request.query.clone(), e.clone()),
            None => SearchResponse::ok(request.query.clone(), Vec::new()),
        }
    }
}

/// LLM adapter replaying a script of responses and recording every request
#[derive(Default)]
pub struct ScriptedAdapter {
    script: Mutex<VecDeque<AppResult<LLMResponse>>>,
    requests: Mutex<Vec<LLMRequest>>,
    delay: Option<Duration>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, content: &str) -> Self {
        self.push(Ok(LLMResponse::text(content)))
    }

    pub fn tool_call(self, id: &str, name: &str, arguments: &str) -> Self {
        let mut response = LLMResponse::text("");
        response.finish_reason = "tool_calls".to_string();
        response.tool_calls = vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }];
        self.push(Ok(response))
    }

    pub fn error(self, message: &str) -> Self {
        self.push(Err(AppError::LLMApi(message.to_string())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, response: AppResult<LLMResponse>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMAdapter for ScriptedAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::LLMApi("script exhausted".to_string())))
    }
}

pub fn result(title: &str, url: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        published_date: Some("2024-03-01".to_string()),
        content_preview: Some(format!("Preview of {}", title)),
    }
}
