use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub openai_api_key: String,
    pub base_url: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
    pub max_tool_call_attempts: usize,
}

impl LLMConfig {
    /// Key from the environment, if one was set
    pub fn active_api_key(&self) -> Option<String> {
        non_empty(&self.openai_api_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub exa_api_key: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_results: usize,
    pub max_preview_chars: usize,
}

impl SearchConfig {
    pub fn active_api_key(&self) -> Option<String> {
        non_empty(&self.exa_api_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                port: parse_var(&lookup, "PORT", "8501")?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                provider: var("LLM_PROVIDER", "openai"),
                openai_api_key: var("OPENAI_API_KEY", ""),
                base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                default_model: var("NEWSLETTER_MODEL", crate::llm::openai::models::DEFAULT),
                request_timeout_secs: parse_var(&lookup, "LLM_TIMEOUT_SECS", "120")?,
                max_tool_call_attempts: parse_var(&lookup, "MAX_TOOL_CALL_ATTEMPTS", "5")?,
            },
            search: SearchConfig {
                exa_api_key: var("EXA_API_KEY", ""),
                base_url: var("EXA_BASE_URL", "https://api.exa.ai"),
                request_timeout_secs: parse_var(&lookup, "SEARCH_TIMEOUT_SECS", "30")?,
                max_results: parse_var(&lookup, "SEARCH_MAX_RESULTS", "5")?,
                max_preview_chars: parse_var(&lookup, "SEARCH_MAX_PREVIEW_CHARS", "500")?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}
