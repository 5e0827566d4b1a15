use crate::agents::{PipelineCredentials, PipelineResult};
use crate::config::Config;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

pub const RETRY_HINT: &str = "Please check your API keys and internet connection and try again.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewsletterRequest {
    #[validate(length(min = 1, max = 500, message = "topic must be between 1 and 500 characters"))]
    pub topic: String,
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    pub exa_api_key: Option<String>,
    #[serde(default)]
    pub show_intermediate: bool,
}

impl NewsletterRequest {
    pub fn credentials(&self) -> PipelineCredentials {
        PipelineCredentials {
            openai_api_key: self.openai_api_key.clone(),
            exa_api_key: self.exa_api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterResponse {
    pub run_id: Uuid,
    pub topic: String,
    #[serde(rename = "final")]
    pub final_text: String,
    pub download_filename: String,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
}

impl NewsletterResponse {
    pub fn from_result(
        run_id: Uuid,
        topic: &str,
        result: PipelineResult,
        elapsed_ms: u64,
        show_intermediate: bool,
    ) -> Self {
        let (research, insights, draft) = if show_intermediate {
            (Some(result.research), Some(result.insights), Some(result.draft))
        } else {
            (None, None, None)
        };

        Self {
            run_id,
            topic: topic.to_string(),
            final_text: result.final_text,
            download_filename: download_filename(topic),
            elapsed_ms,
            research,
            insights,
            draft,
        }
    }
}

/// Name offered for the downloaded newsletter
pub fn download_filename(topic: &str) -> String {
    let stem: String = topic
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("ai_newsletter_{}.md", stem)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchApiRequest {
    #[validate(length(min = 1, max = 500, message = "query must be between 1 and 500 characters"))]
    pub query: String,
    #[validate(range(max = 365))]
    pub days_back: Option<u32>,
    #[validate(range(min = 1, max = 25))]
    pub max_results: Option<usize>,
    pub exa_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub openai_key_configured: bool,
    pub exa_key_configured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename() {
        assert_eq!(
            download_filename("quantum error correction"),
            "ai_newsletter_quantum_error_correction.md"
        );
        assert_eq!(download_filename("LLMs"), "ai_newsletter_LLMs.md");
        assert_eq!(download_filename("AI/ML"), "ai_newsletter_AI_ML.md");
        assert_eq!(download_filename(r"..\secrets"), "ai_newsletter_.._secrets.md");
    }

    #[test]
    fn test_topic_length_is_validated() {
        let request: NewsletterRequest = serde_json::from_value(serde_json::json!({ "topic": "" })).unwrap();
        assert!(request.validate().is_err());
        assert!(!request.show_intermediate);

        let request: NewsletterRequest =
            serde_json::from_value(serde_json::json!({ "topic": "x".repeat(501) })).unwrap();
        assert!(request.validate().is_err());

        let request: NewsletterRequest =
            serde_json::from_value(serde_json::json!({ "topic": "robotics", "show_intermediate": true })).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_search_window_may_be_zero() {
        let request: SearchApiRequest =
            serde_json::from_value(serde_json::json!({ "query": "rust", "days_back": 0 })).unwrap();
        assert!(request.validate().is_ok());

        let request: SearchApiRequest =
            serde_json::from_value(serde_json::json!({ "query": "rust", "days_back": 366 })).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_intermediates_only_when_requested() {
        let result = PipelineResult {
            research: "r".to_string(),
            insights: "i".to_string(),
            draft: "d".to_string(),
            final_text: "f".to_string(),
        };

        let hidden = NewsletterResponse::from_result(Uuid::nil(), "ai", result.clone(), 10, false);
        let json = serde_json::to_value(&hidden).unwrap();
        assert_eq!(json["final"], "f");
        assert!(json.get("research").is_none());

        let shown = NewsletterResponse::from_result(Uuid::nil(), "ai", result, 10, true);
        let json = serde_json::to_value(&shown).unwrap();
        assert_eq!(json["draft"], "d");
        assert_eq!(json["download_filename"], "ai_newsletter_ai.md");
    }
}
