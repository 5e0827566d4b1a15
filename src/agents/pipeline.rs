//! Pipeline Orchestrator
//!
//! Drives the four stages in a fixed order:
//!
//! ```text
//! Idle → Searching → Researching → Synthesizing → Drafting → Editing → Done
//!            └────────────┴─────────────┴────────────┴──────────┴──→ Failed
//! ```
//!
//! Each stage's text is the next stage's input. Fresh search results feed
//! the first two stages only. A failing stage stops the run; no partial
//! result is ever returned.

use crate::agents::context::{bounded_prefix, render_search_context};
use crate::agents::prompt::StagePromptBuilder;
use crate::agents::roles::StageRole;
use crate::config::Config;
use crate::llm::{create_adapter, CompletionInvoker, LLMProviderConfig, StageResult, ToolSet};
use crate::llm::openai::models;
use crate::search::{ExaClient, SearchError, SearchProvider, SearchRequest, WebSearchTool};
use crate::types::{AppError, AppResult, LLMMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Knobs for the orchestrator's own searches
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub max_results: usize,
    pub max_preview_chars: usize,
    pub primary_days_back: u32,
    pub secondary_days_back: u32,
    /// Characters of search context quoted to the insights stage
    pub insights_context_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_preview_chars: 500,
            primary_days_back: 7,
            secondary_days_back: 14,
            insights_context_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Searching,
    Researching,
    Synthesizing,
    Drafting,
    Editing,
    Done,
    Failed,
}

impl PipelineState {
    fn for_role(role: StageRole) -> Self {
        match role {
            StageRole::Researcher => PipelineState::Researching,
            StageRole::InsightsExpert => PipelineState::Synthesizing,
            StageRole::Writer => PipelineState::Drafting,
            StageRole::Editor => PipelineState::Editing,
        }
    }
}

/// Artifacts of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub research: String,
    pub insights: String,
    pub draft: String,
    #[serde(rename = "final")]
    pub final_text: String,
}

/// What one stage sends to the completion provider
#[derive(Debug, Clone, PartialEq)]
pub struct StageRequest {
    pub role: StageRole,
    pub directive: String,
    pub history: Vec<LLMMessage>,
}

impl StageRequest {
    pub fn new(role: StageRole, topic: &str, prior: Option<&str>, context: Option<&str>) -> Self {
        Self {
            role,
            directive: StagePromptBuilder::build(role, topic, prior, context),
            history: vec![LLMMessage::user(StagePromptBuilder::kickoff_message(role, topic))],
        }
    }
}

/// API keys supplied by the caller; blank values fall back to the configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineCredentials {
    pub openai_api_key: Option<String>,
    pub exa_api_key: Option<String>,
}

fn resolve_key(supplied: Option<&str>, fallback: Option<String>) -> Option<String> {
    supplied
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .or(fallback)
}

pub struct NewsletterPipeline {
    search: Arc<dyn SearchProvider>,
    invoker: CompletionInvoker,
    settings: PipelineSettings,
}

impl NewsletterPipeline {
    pub fn new(search: Arc<dyn SearchProvider>, invoker: CompletionInvoker) -> Self {
        Self {
            search,
            invoker,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wire up the Exa and OpenAI clients for one run
    pub fn from_config(
        config: &Config,
        model: Option<&str>,
        credentials: &PipelineCredentials,
    ) -> AppResult<Self> {
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(config.llm.default_model.as_str());
        if !models::is_known(model) {
            return Err(AppError::InvalidRequest(format!(
                "Unknown model '{}'. Known models: {}",
                model,
                models::KNOWN.join(", ")
            )));
        }

        let openai_key = resolve_key(credentials.openai_api_key.as_deref(), config.llm.active_api_key())
            .ok_or_else(|| AppError::CredentialMissing("OpenAI".to_string()))?;
        let exa_key = resolve_key(credentials.exa_api_key.as_deref(), config.search.active_api_key())
            .ok_or_else(|| AppError::CredentialMissing("Exa".to_string()))?;

        let adapter = create_adapter(LLMProviderConfig {
            name: config.llm.provider.clone(),
            api_key: openai_key,
            base_url: config.llm.base_url.clone(),
            timeout: config.llm.request_timeout(),
        })?;
        let invoker = CompletionInvoker::new(adapter, model)
            .with_timeout(config.llm.request_timeout())
            .with_max_tool_call_attempts(config.llm.max_tool_call_attempts);

        let search = Arc::new(ExaClient::new(Some(exa_key), &config.search)?);

        Ok(Self::new(search, invoker).with_settings(PipelineSettings {
            max_results: config.search.max_results,
            max_preview_chars: config.search.max_preview_chars,
            ..PipelineSettings::default()
        }))
    }

    pub fn model(&self) -> &str {
        self.invoker.model()
    }

    pub async fn run(&self, topic: &str) -> AppResult<PipelineResult> {
        self.run_observed(topic, |_| {}).await
    }

    /// Run the pipeline, reporting every state transition to `on_transition`
    pub async fn run_observed<F>(&self, topic: &str, on_transition: F) -> AppResult<PipelineResult>
    where
        F: FnMut(PipelineState) + Send,
    {
        self.run_identified(Uuid::new_v4(), topic, on_transition).await
    }

    /// Same as `run_observed`, with the run id chosen by the caller
    pub async fn run_identified<F>(
        &self,
        run_id: Uuid,
        topic: &str,
        mut on_transition: F,
    ) -> AppResult<PipelineResult>
    where
        F: FnMut(PipelineState) + Send,
    {
        on_transition(PipelineState::Idle);

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidRequest("topic must not be empty".to_string()));
        }

        let span = info_span!("pipeline", %run_id, topic = %topic);

        async move {
            let mut advance = |state: PipelineState| {
                info!(state = ?state, "Pipeline state changed");
                on_transition(state);
            };

            match self.execute(topic, &mut advance).await {
                Ok(result) => {
                    advance(PipelineState::Done);
                    Ok(result)
                }
                Err(e) => {
                    error!(error = %e, "Pipeline failed");
                    advance(PipelineState::Failed);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        topic: &str,
        advance: &mut (dyn FnMut(PipelineState) + Send),
    ) -> AppResult<PipelineResult> {
        advance(PipelineState::Searching);
        let context = self.gather_context(topic).await?;

        advance(PipelineState::for_role(StageRole::Researcher));
        let research = self.run_stage(StageRole::Researcher, topic, None, Some(&context)).await?;

        advance(PipelineState::for_role(StageRole::InsightsExpert));
        let context_prefix = bounded_prefix(&context, self.settings.insights_context_chars);
        let insights = self
            .run_stage(StageRole::InsightsExpert, topic, Some(&research), Some(&context_prefix))
            .await?;

        advance(PipelineState::for_role(StageRole::Writer));
        let draft = self.run_stage(StageRole::Writer, topic, Some(&insights), None).await?;

        advance(PipelineState::for_role(StageRole::Editor));
        let final_text = self.run_stage(StageRole::Editor, topic, Some(&draft), None).await?;

        Ok(PipelineResult {
            research,
            insights,
            draft,
            final_text,
        })
    }

    /// Two recency-windowed searches folded into one context block
    async fn gather_context(&self, topic: &str) -> AppResult<String> {
        let queries = [
            (format!("latest developments in {}", topic), self.settings.primary_days_back),
            (format!("impact of {}", topic), self.settings.secondary_days_back),
        ];

        let mut responses = Vec::with_capacity(queries.len());
        for (query, days_back) in queries {
            let request = SearchRequest::new(query)
                .with_days_back(days_back)
                .with_max_results(self.settings.max_results)
                .with_max_preview_chars(self.settings.max_preview_chars);
            responses.push(self.search.search(&request).await);
        }

        if responses.iter().all(|r| !r.success) {
            if responses.iter().any(|r| r.error == Some(SearchError::NoApiKey)) {
                return Err(AppError::CredentialMissing("Exa".to_string()));
            }
            let reasons: Vec<&str> = responses
                .iter()
                .filter_map(|r| r.error_message.as_deref())
                .collect();
            return Err(AppError::SearchFailure(reasons.join("; ")));
        }

        Ok(render_search_context(&responses))
    }

    async fn run_stage(
        &self,
        role: StageRole,
        topic: &str,
        prior: Option<&str>,
        context: Option<&str>,
    ) -> AppResult<String> {
        let request = StageRequest::new(role, topic, prior, context);
        let tools = if role.uses_search_tool() {
            ToolSet::new().with(Arc::new(WebSearchTool::new(self.search.clone())))
        } else {
            ToolSet::new()
        };

        info!(stage = role.stage_name(), role = %role, directive_len = request.directive.len(), "Running stage");

        let result = self
            .invoker
            .complete(&request.directive, &request.history, &tools, &role.generation_params())
            .await;

        match &result {
            StageResult::Completed { text, tool_calls, warnings } => {
                if !warnings.is_empty() {
                    warn!(stage = role.stage_name(), ?warnings, "Stage completed with warnings");
                }
                info!(stage = role.stage_name(), tool_calls, output_len = text.len(), "Stage complete");
            }
            StageResult::Failed { error } => {
                error!(stage = role.stage_name(), error = %error, "Stage failed");
            }
        }

        result.into_text(role.stage_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::context::count_result_blocks;
    use crate::search::tool::TOOL_NAME;
    use crate::testing::{result, CannedSearch, ScriptedAdapter};
    use std::sync::Mutex;

    const TOPIC: &str = "quantum error correction";
    const PRIMARY: &str = "latest developments in quantum error correction";
    const SECONDARY: &str = "impact of quantum error correction";

    fn canned_search() -> Arc<CannedSearch> {
        Arc::new(
            CannedSearch::new()
                .respond(PRIMARY, vec![result("Surface codes", "https://a.test"), result("Cat qubits", "https://b.test")])
                .respond(SECONDARY, vec![result("Fault tolerance", "https://c.test")]),
        )
    }

    fn pipeline(search: Arc<CannedSearch>, adapter: Arc<ScriptedAdapter>) -> NewsletterPipeline {
        NewsletterPipeline::new(search, CompletionInvoker::new(adapter, "gpt-4-turbo"))
    }

    fn system_text(adapter: &ScriptedAdapter, index: usize) -> String {
        adapter.requests()[index].messages[0].content.clone()
    }

    #[tokio::test]
    async fn test_end_to_end_with_fixed_stage_outputs() {
        let search = canned_search();
        let adapter = Arc::new(ScriptedAdapter::new().text("R1").text("I1").text("D1").text("F1"));

        let result = pipeline(search.clone(), adapter.clone()).run(TOPIC).await.unwrap();

        assert_eq!(
            result,
            PipelineResult {
                research: "R1".to_string(),
                insights: "I1".to_string(),
                draft: "D1".to_string(),
                final_text: "F1".to_string(),
            }
        );

        let searches = search.requests();
        assert_eq!(searches.len(), 2);
        assert_eq!((searches[0].query.as_str(), searches[0].days_back), (PRIMARY, 7));
        assert_eq!((searches[1].query.as_str(), searches[1].days_back), (SECONDARY, 14));
        assert_eq!(adapter.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_stage_outputs_flow_forward() {
        let search = canned_search();
        let adapter = Arc::new(ScriptedAdapter::new().text("R1").text("I1").text("D1").text("F1"));

        pipeline(search, adapter.clone()).run(TOPIC).await.unwrap();

        let research = system_text(&adapter, 0);
        assert_eq!(count_result_blocks(&research), 3);
        assert!(system_text(&adapter, 1).contains("R1"));
        assert!(system_text(&adapter, 2).contains("I1"));
        assert!(system_text(&adapter, 3).contains("D1"));

        let requests = adapter.requests();
        assert_eq!(requests[0].tools[0].name, TOOL_NAME);
        assert_eq!(requests[1].tools[0].name, TOOL_NAME);
        assert!(requests[2].tools.is_empty());
        assert!(requests[3].tools.is_empty());
        assert_eq!(requests[0].temperature, Some(0.1));
        assert_eq!(requests[3].temperature, None);
    }

    #[tokio::test]
    async fn test_final_comes_from_editor() {
        let adapter = Arc::new(
            ScriptedAdapter::new()
                .text("research")
                .text("insights")
                .text("Draft body")
                .text("Draft body\n\n[sources cited]"),
        );

        let result = pipeline(canned_search(), adapter).run(TOPIC).await.unwrap();

        assert_ne!(result.final_text, result.draft);
        assert!(result.final_text.ends_with("[sources cited]"));
        for field in [&result.research, &result.insights, &result.draft, &result.final_text] {
            assert!(!field.is_empty());
        }
    }

    #[tokio::test]
    async fn test_insights_failure_stops_pipeline() {
        let adapter = Arc::new(ScriptedAdapter::new().text("R1").error("upstream 500"));
        let states = Mutex::new(Vec::new());

        let err = pipeline(canned_search(), adapter.clone())
            .run_observed(TOPIC, |s| states.lock().unwrap().push(s))
            .await
            .unwrap_err();

        match err {
            AppError::GenerationFailure { stage, message } => {
                assert_eq!(stage, "insights");
                assert!(message.contains("upstream 500"));
            }
            other => panic!("expected generation failure, got {:?}", other),
        }
        assert_eq!(adapter.requests().len(), 2);
        assert_eq!(
            *states.lock().unwrap(),
            vec![
                PipelineState::Idle,
                PipelineState::Searching,
                PipelineState::Researching,
                PipelineState::Synthesizing,
                PipelineState::Failed,
            ]
        );
    }

    #[tokio::test]
    async fn test_transitions_on_success() {
        let adapter = Arc::new(ScriptedAdapter::new().text("R").text("I").text("D").text("F"));
        let mut states = Vec::new();

        pipeline(canned_search(), adapter)
            .run_observed(TOPIC, |s| states.push(s))
            .await
            .unwrap();

        assert_eq!(
            states,
            vec![
                PipelineState::Idle,
                PipelineState::Searching,
                PipelineState::Researching,
                PipelineState::Synthesizing,
                PipelineState::Drafting,
                PipelineState::Editing,
                PipelineState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_search_key_is_fatal() {
        let search = Arc::new(
            CannedSearch::new()
                .fail(PRIMARY, SearchError::NoApiKey)
                .fail(SECONDARY, SearchError::NoApiKey),
        );
        let adapter = Arc::new(ScriptedAdapter::new());

        let err = pipeline(search, adapter.clone()).run(TOPIC).await.unwrap_err();

        assert_eq!(err.kind(), "CredentialMissing");
        assert!(adapter.requests().is_empty());
    }

    #[tokio::test]
    async fn test_all_searches_failing_is_fatal() {
        let search = Arc::new(
            CannedSearch::new()
                .fail(PRIMARY, SearchError::RequestFailed("dns".to_string()))
                .fail(SECONDARY, SearchError::RequestFailed("reset".to_string())),
        );
        let adapter = Arc::new(ScriptedAdapter::new());

        let err = pipeline(search, adapter.clone()).run(TOPIC).await.unwrap_err();

        assert_eq!(err.kind(), "SearchFailure");
        assert!(err.to_string().contains("dns"));
        assert!(err.to_string().contains("reset"));
        assert!(adapter.requests().is_empty());
    }

    #[tokio::test]
    async fn test_one_failed_search_is_tolerated() {
        let search = Arc::new(
            CannedSearch::new()
                .fail(PRIMARY, SearchError::RequestFailed("dns".to_string()))
                .respond(SECONDARY, vec![result("Fault tolerance", "https://c.test")]),
        );
        let adapter = Arc::new(ScriptedAdapter::new().text("R").text("I").text("D").text("F"));

        let result = pipeline(search, adapter.clone()).run(TOPIC).await.unwrap();

        assert_eq!(result.final_text, "F");
        assert_eq!(count_result_blocks(&system_text(&adapter, 0)), 1);
    }

    #[tokio::test]
    async fn test_insights_context_is_bounded() {
        let mut results = Vec::new();
        for title in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
            let mut r = result(title, "https://x.test");
            r.content_preview = Some("y".repeat(400));
            results.push(r);
        }
        let search = Arc::new(CannedSearch::new().respond(PRIMARY, results));
        let adapter = Arc::new(ScriptedAdapter::new().text("R").text("I").text("D").text("F"));

        pipeline(search, adapter.clone()).run(TOPIC).await.unwrap();

        let research = system_text(&adapter, 0);
        let insights = system_text(&adapter, 1);
        assert!(research.contains("Title: Echo"));
        assert!(insights.contains("Title: Alpha"));
        assert!(!insights.contains("Title: Echo"));
    }

    #[tokio::test]
    async fn test_result_cap_limits_rendered_blocks() {
        let many: Vec<_> = (0..8).map(|i| result(&format!("R{}", i), "https://x.test")).collect();
        let search = Arc::new(CannedSearch::new().respond(PRIMARY, many));
        let adapter = Arc::new(ScriptedAdapter::new().text("R").text("I").text("D").text("F"));

        pipeline(search, adapter.clone())
            .with_settings(PipelineSettings { max_results: 3, ..PipelineSettings::default() })
            .run(TOPIC)
            .await
            .unwrap();

        assert_eq!(count_result_blocks(&system_text(&adapter, 0)), 3);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_isolated() {
        let first = Arc::new(ScriptedAdapter::new().text("R-a").text("I-a").text("D-a").text("F-a"));
        let second = Arc::new(ScriptedAdapter::new().text("R-b").text("I-b").text("D-b").text("F-b"));
        let a = pipeline(canned_search(), first.clone());
        let b = pipeline(canned_search(), second.clone());

        let (ra, rb) = tokio::join!(a.run(TOPIC), b.run("robotics"));

        assert_eq!(ra.unwrap().final_text, "F-a");
        assert_eq!(rb.unwrap().final_text, "F-b");
        assert!(system_text(&second, 3).contains("D-b"));
        assert!(!system_text(&second, 3).contains("D-a"));
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let search = canned_search();
        let adapter = Arc::new(ScriptedAdapter::new());

        let mut states = Vec::new();

        let err = pipeline(search.clone(), adapter)
            .run_observed("   ", |s| states.push(s))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "InvalidRequest");
        assert_eq!(states, vec![PipelineState::Idle]);
        assert!(search.requests().is_empty());
    }

    #[test]
    fn test_from_config_requires_keys() {
        let config = Config::from_vars(|_| None).unwrap();
        let err = NewsletterPipeline::from_config(&config, None, &PipelineCredentials::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "No API key available for OpenAI");

        let credentials = PipelineCredentials {
            openai_api_key: Some("sk-test".to_string()),
            exa_api_key: Some("  ".to_string()),
        };
        let err = NewsletterPipeline::from_config(&config, None, &credentials).err().unwrap();
        assert_eq!(err.to_string(), "No API key available for Exa");
    }

    #[test]
    fn test_from_config_validates_model() {
        let config = Config::from_vars(|_| None).unwrap();
        let credentials = PipelineCredentials {
            openai_api_key: Some("sk-test".to_string()),
            exa_api_key: Some("exa-test".to_string()),
        };

        let err = NewsletterPipeline::from_config(&config, Some("gpt-2"), &credentials).err().unwrap();
        assert_eq!(err.kind(), "InvalidRequest");

        let pipeline = NewsletterPipeline::from_config(&config, Some("gpt-4o"), &credentials).unwrap();
        assert_eq!(pipeline.model(), "gpt-4o");

        let pipeline = NewsletterPipeline::from_config(&config, None, &credentials).unwrap();
        assert_eq!(pipeline.model(), "gpt-4-turbo");
    }

    #[test]
    fn test_final_serializes_as_final() {
        let result = PipelineResult {
            research: "r".to_string(),
            insights: "i".to_string(),
            draft: "d".to_string(),
            final_text: "f".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["final"], "f");
    }
}
