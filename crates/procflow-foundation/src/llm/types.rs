//! Chat-completion request and response types.
//!
//! Minimal wire-adjacent types for the single external service this core
//! talks to. The provider trait in [`super::provider`] keeps backends
//! swappable; tests use a scripted stub instead of the network.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat-completion request.
///
/// Optional fields fall back to the provider's configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The generated text plus optional usage accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Chat provider errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The endpoint could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("api error ({code}): {message}")]
    Api { code: String, message: String },

    /// The response body could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other provider failure.
    #[error("{0}")]
    Other(String),
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
