use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider connection
#[derive(Debug, Clone)]
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Build the adapter for a configured provider
pub fn create_adapter(provider: LLMProviderConfig) -> AppResult<Arc<dyn LLMAdapter>> {
    if provider.api_key.trim().is_empty() {
        return Err(AppError::CredentialMissing(provider.name));
    }

    match provider.name.as_str() {
        "openai" => Ok(Arc::new(crate::llm::openai::OpenAIAdapter::new(
            &provider.api_key,
            &provider.base_url,
            provider.timeout,
        )?)),
        other => Err(AppError::Config(format!("Unsupported provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, key: &str) -> LLMProviderConfig {
        LLMProviderConfig {
            name: name.to_string(),
            api_key: key.to_string(),
            base_url: "http://localhost".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_missing_key_is_credential_error() {
        let err = create_adapter(provider("openai", "  ")).err().unwrap();
        assert_eq!(err.kind(), "CredentialMissing");
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_adapter(provider("carrier-pigeon", "key")).err().unwrap();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn test_openai_adapter_is_built() {
        assert!(create_adapter(provider("openai", "sk-test")).is_ok());
    }
}
