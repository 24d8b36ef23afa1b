//! Chat-completion provider trait.

use async_trait::async_trait;
use std::sync::Arc;

use super::types::{ChatRequest, ChatResponse, ChatResult};

/// Backend issuing chat-completion requests.
///
/// The HTTP implementation lives in [`super::http`]; tests implement
/// this trait with scripted responses so no network is involved.
#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Whether a credential is configured. The prompt executor turns a
    /// `false` here into a non-throwing error output instead of issuing
    /// a request.
    fn is_configured(&self) -> bool {
        true
    }

    /// Issue one chat-completion request and await the full response.
    async fn complete(&self, request: ChatRequest) -> ChatResult<ChatResponse>;
}

/// Dynamic dispatch provider handle shared across executions.
pub type DynChatProvider = Arc<dyn ChatCompletionProvider>;
