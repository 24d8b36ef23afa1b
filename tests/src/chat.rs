use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

use procflow_foundation::llm::{
    ChatCompletionProvider, ChatError, ChatRequest, ChatResponse, ChatResult,
};

/// A mock backend that implements `ChatCompletionProvider`.
/// It allows developers to specify predefined responses for specific
/// prompts, enabling deterministic testing of process executions without
/// hitting real APIs.
#[derive(Clone, Default)]
pub struct MockChatBackend {
    /// Maps a prompt substring to a predefined response string
    predefined_responses: Arc<RwLock<HashMap<String, String>>>,
    /// Fallback response if no predefined prompt matches
    fallback_response: String,
    /// Error every call fails with, when set
    failure: Option<String>,
    /// Pretend no credential is configured
    unconfigured: bool,
    /// Token cancelled from inside `complete`, for cancellation tests
    cancel_on_call: Option<CancellationToken>,
    /// Call counter
    calls: Arc<RwLock<usize>>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self {
            predefined_responses: Arc::new(RwLock::new(HashMap::new())),
            fallback_response: "This is a fallback mock response.".to_string(),
            failure: None,
            unconfigured: false,
            cancel_on_call: None,
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Add a predefined response for a given prompt substring.
    /// If the prompt contains `key`, it will return `response`.
    pub fn add_mock_response(&self, prompt_key: &str, response: &str) {
        if let Ok(mut resps) = self.predefined_responses.write() {
            resps.insert(prompt_key.to_string(), response.to_string());
        }
    }

    /// Set the fallback response for when no predefined response matches.
    pub fn set_fallback_response(&mut self, response: &str) {
        self.fallback_response = response.to_string();
    }

    /// A backend whose every call fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// A backend that reports no configured credential.
    pub fn without_credential() -> Self {
        Self {
            unconfigured: true,
            ..Self::new()
        }
    }

    /// Cancel `token` as a side effect of the next completions, so a
    /// test can deterministically hit the orchestrator's next step
    /// boundary in the cancelled state.
    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel_on_call: Some(token),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl ChatCompletionProvider for MockChatBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured
    }

    async fn complete(&self, request: ChatRequest) -> ChatResult<ChatResponse> {
        if let Ok(mut calls) = self.calls.write() {
            *calls += 1;
        }

        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }

        if let Some(message) = &self.failure {
            return Err(ChatError::Other(message.clone()));
        }

        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let mut response = self.fallback_response.clone();
        if let Ok(resps) = self.predefined_responses.read() {
            for (key, value) in resps.iter() {
                if prompt.contains(key) {
                    response = value.clone();
                    break;
                }
            }
        }

        Ok(ChatResponse {
            content: response,
            total_tokens: Some(prompt.split_whitespace().count() as u32),
        })
    }
}
