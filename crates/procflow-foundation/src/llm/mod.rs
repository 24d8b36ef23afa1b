//! Chat-completion client.
//!
//! The one external service this core calls: an HTTPS chat-completion
//! endpoint used by the language-model prompt step. Everything is behind
//! [`ChatCompletionProvider`] so executions can run against a stub.

mod http;
mod provider;
mod types;

pub use http::{ChatConfig, HttpChatProvider};
pub use provider::{ChatCompletionProvider, DynChatProvider};
pub use types::{ChatError, ChatMessage, ChatRequest, ChatResponse, ChatResult, Role};
