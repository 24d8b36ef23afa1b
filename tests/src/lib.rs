//! ProcFlow Testing Framework
//!
//! Provides utilities for testing process executions without requiring
//! live API calls: a scripted chat backend stands in for the external
//! language-model service.

pub mod chat;

pub use chat::MockChatBackend;
