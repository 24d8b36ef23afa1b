//! HTTP chat-completion provider.
//!
//! Bearer-token authenticated POST against an OpenAI-compatible
//! `/v1/chat/completions` endpoint. The generated text is read from
//! `choices[0].message.content` and token usage, when present, from
//! `usage.total_tokens`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::provider::ChatCompletionProvider;
use super::types::{ChatError, ChatRequest, ChatResponse, ChatResult};

/// HTTP provider configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Bearer token. Empty means not configured.
    pub api_key: String,
    /// Base URL, e.g. `https://api.openai.com`.
    pub base_url: String,
    /// Default model.
    pub default_model: String,
    /// Default sampling temperature.
    pub default_temperature: f32,
    /// Default max output tokens.
    pub default_max_tokens: u32,
    /// Request timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            default_temperature: 0.7,
            default_max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self {
            api_key: std::env::var("PROCFLOW_LLM_API_KEY").unwrap_or_default(),
            ..Default::default()
        };

        if let Ok(base_url) = std::env::var("PROCFLOW_LLM_BASE_URL") {
            cfg.base_url = base_url;
        }
        if let Ok(model) = std::env::var("PROCFLOW_LLM_MODEL") {
            cfg.default_model = model;
        }

        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.default_max_tokens = tokens;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Chat-completion provider over HTTPS.
pub struct HttpChatProvider {
    client: reqwest::Client,
    config: ChatConfig,
}

impl HttpChatProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(ChatConfig::new(api_key))
    }

    pub fn from_env() -> Self {
        Self::with_config(ChatConfig::from_env())
    }

    pub fn with_config(config: ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, config }
    }

    fn map_error(err: reqwest::Error) -> ChatError {
        if err.is_timeout() {
            ChatError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ChatError::Network(err.to_string())
        } else {
            ChatError::Other(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[async_trait]
impl ChatCompletionProvider for HttpChatProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn complete(&self, request: ChatRequest) -> ChatResult<ChatResponse> {
        let model = request
            .model
            .unwrap_or_else(|| self.config.default_model.clone());
        let temperature = request
            .temperature
            .unwrap_or(self.config.default_temperature);
        let max_tokens = request.max_tokens.unwrap_or(self.config.default_max_tokens);

        let body = serde_json::json!({
            "model": model,
            "messages": request.messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(%url, %model, "issuing chat completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Self::map_error)?;

        if !status.is_success() {
            return Err(ChatError::Api {
                code: status.as_u16().to_string(),
                message: text,
            });
        }

        let parsed: WireResponse =
            serde_json::from_str(&text).map_err(|e| ChatError::Serialization(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ChatError::Api {
                code: status.as_u16().to_string(),
                message: "response contained no choices".to_string(),
            })?;

        Ok(ChatResponse {
            content,
            total_tokens: parsed.usage.and_then(|u| u.total_tokens),
        })
    }
}
