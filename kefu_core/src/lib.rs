#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod generation;
pub mod history;
mod util;

pub use generation::normalize_generation;
pub use history::{Exchange, HistoryWindow, approx_tokens};
pub use util::{DEFAULT_PLATFORM, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_ID};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Normalized output of a generation call.
///
/// Adapters reduce whatever shape the engine returns to plain text before
/// building this, so callers never inspect raw engine payloads.
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse>;
    fn get_default_model(&self) -> &str;
}

/// Append-only log of past exchanges keyed by (user, platform).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, exchange: &Exchange) -> anyhow::Result<()>;

    /// Most recent exchanges first, bounded by `max_count` and by the
    /// cumulative [`approx_tokens`] budget `max_tokens`.
    async fn query_recent(
        &self,
        user_id: &str,
        platform: &str,
        max_count: usize,
        max_tokens: usize,
    ) -> anyhow::Result<HistoryWindow>;
}

/// External RAG backend.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Open a retrieval session for a user and return its opaque handle.
    async fn create_session(&self, user_id: &str) -> anyhow::Result<String>;

    /// Ask a question inside a session.
    ///
    /// `Ok(None)` means the backend answered with a body that could not be
    /// parsed; callers treat it as "no answer available".
    async fn query(&self, session_id: &str, question: &str) -> anyhow::Result<Option<String>>;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Arc<T> {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        (**self).chat(messages, model).await
    }

    fn get_default_model(&self) -> &str {
        (**self).get_default_model()
    }
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn append(&self, exchange: &Exchange) -> anyhow::Result<()> {
        (**self).append(exchange).await
    }

    async fn query_recent(
        &self,
        user_id: &str,
        platform: &str,
        max_count: usize,
        max_tokens: usize,
    ) -> anyhow::Result<HistoryWindow> {
        (**self)
            .query_recent(user_id, platform, max_count, max_tokens)
            .await
    }
}

#[async_trait]
impl<T: RetrievalService + ?Sized> RetrievalService for Arc<T> {
    async fn create_session(&self, user_id: &str) -> anyhow::Result<String> {
        (**self).create_session(user_id).await
    }

    async fn query(&self, session_id: &str, question: &str) -> anyhow::Result<Option<String>> {
        (**self).query(session_id, question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::assistant("hi");
        let json = serde_json::to_value(&msg);
        assert!(json.is_ok(), "serialize failed: {json:?}");
        let Ok(json) = json else { return };
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }
}
