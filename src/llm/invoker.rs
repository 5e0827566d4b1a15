//! Completion Invoker
//!
//! Runs one stage's completion against an `LLMAdapter`, including the tool
//! loop: when the model asks for tools, the invoker executes them, appends the
//! results to the conversation and asks again. The loop is bounded by
//! `max_tool_call_attempts`; once the bound is hit the model gets one last
//! turn with tool choice forced to `none`, so a stage always ends in text.
//!
//! Every provider fault, including a timeout, comes back as
//! `StageResult::Failed`. Nothing here returns `Err`.

use crate::llm::provider::LLMAdapter;
use crate::llm::tools::ToolSet;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, ToolChoice};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_MAX_TOOL_CALL_ATTEMPTS: usize = 5;

/// Sampling parameters for one stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    /// `None` leaves the provider default in place
    pub temperature: Option<f32>,
    pub tool_choice: ToolChoice,
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    /// Low-variance settings for factual synthesis with tools available
    pub fn factual() -> Self {
        Self {
            temperature: Some(0.1),
            tool_choice: ToolChoice::Auto,
            max_tokens: None,
        }
    }
}

/// Non-fatal conditions observed while completing a stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageWarning {
    ToolAttemptLimitReached { attempts: usize },
}

/// Outcome of one stage completion. Exactly one of text or error exists.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    Completed {
        text: String,
        tool_calls: usize,
        warnings: Vec<StageWarning>,
    },
    Failed {
        error: String,
    },
}

impl StageResult {
    pub fn failed(error: impl Into<String>) -> Self {
        StageResult::Failed { error: error.into() }
    }

    pub fn success(&self) -> bool {
        matches!(self, StageResult::Completed { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            StageResult::Completed { text, .. } => Some(text),
            StageResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StageResult::Completed { .. } => None,
            StageResult::Failed { error } => Some(error),
        }
    }

    /// Convert into the pipeline's error type, naming the stage on failure
    pub fn into_text(self, stage: &str) -> AppResult<String> {
        match self {
            StageResult::Completed { text, .. } => Ok(text),
            StageResult::Failed { error } => Err(AppError::GenerationFailure {
                stage: stage.to_string(),
                message: error,
            }),
        }
    }
}

pub struct CompletionInvoker {
    adapter: Arc<dyn LLMAdapter>,
    model: String,
    timeout: Duration,
    max_tool_call_attempts: usize,
}

impl CompletionInvoker {
    pub fn new(adapter: Arc<dyn LLMAdapter>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            max_tool_call_attempts: DEFAULT_MAX_TOOL_CALL_ATTEMPTS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tool_call_attempts(mut self, attempts: usize) -> Self {
        self.max_tool_call_attempts = attempts;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Complete `directive` (sent as the system message) followed by `history`
    pub async fn complete(
        &self,
        directive: &str,
        history: &[LLMMessage],
        tools: &ToolSet,
        params: &GenerationParams,
    ) -> StageResult {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(LLMMessage::system(directive));
        messages.extend(history.iter().cloned());

        let mut attempts = 0;
        let mut tool_calls = 0;
        let mut warnings = Vec::new();
        let mut tools_open = !tools.is_empty() && self.max_tool_call_attempts > 0;

        loop {
            let request = LLMRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                tools: tools.definitions(),
                tool_choice: if tools_open { params.tool_choice } else { ToolChoice::None },
            };

            let response = match self.send(&request).await {
                Ok(response) => response,
                Err(e) => return StageResult::failed(e.to_string()),
            };

            if !tools_open || response.tool_calls.is_empty() {
                if response.content.trim().is_empty() {
                    return StageResult::failed("completion provider returned no text");
                }
                return StageResult::Completed {
                    text: response.content,
                    tool_calls,
                    warnings,
                };
            }

            attempts += 1;
            debug!(attempt = attempts, calls = response.tool_calls.len(), "Model requested tools");

            messages.push(LLMMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let output = tools.execute(&call.name, &call.arguments).await;
                tool_calls += 1;
                messages.push(LLMMessage::tool_result(call.id.clone(), output.to_string()));
            }

            if attempts >= self.max_tool_call_attempts {
                warn!(attempts, "Tool call attempt limit reached, asking for a final answer");
                warnings.push(StageWarning::ToolAttemptLimitReached { attempts });
                tools_open = false;
            }
        }
    }

    async fn send(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        match tokio::time::timeout(self.timeout, self.adapter.create_chat_completion(request)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::LLMApi(format!(
                "completion timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}
