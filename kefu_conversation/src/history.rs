//! Conversation history policy and prompt assembly.
//!
//! The history window is fetched once per session and replayed into the
//! prompt on the session's first turn only.

use kefu_core::{ChatMessage, HistoryWindow, Role};
use serde::{Deserialize, Serialize};

/// Bounds for the history window fetched at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of past exchanges
    #[serde(default = "HistoryConfig::default_max_count")]
    pub max_count: usize,
    /// Maximum approximate tokens across those exchanges
    #[serde(default = "HistoryConfig::default_max_tokens")]
    pub max_tokens: usize,
}

impl HistoryConfig {
    const fn default_max_count() -> usize {
        5
    }

    const fn default_max_tokens() -> usize {
        1000
    }

    #[must_use]
    pub const fn with_max_count(mut self, max: usize) -> Self {
        self.max_count = max;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_count: Self::default_max_count(),
            max_tokens: Self::default_max_tokens(),
        }
    }
}

/// Frame a retrieval answer as the final user message of the prompt.
#[must_use]
pub fn frame_retrieval(answer: Option<&str>) -> String {
    format!(
        "RAG Results: {}\nPlease provide a response based on all available information.",
        answer.unwrap_or_default()
    )
}

/// Build the message sequence for one turn.
///
/// System instruction first, then (when `history` is given) each past
/// exchange as a user/assistant pair in window order (most recent first),
/// then the framed retrieval answer.
#[must_use]
pub fn build_llm_messages(
    system_prompt: &str,
    history: Option<&HistoryWindow>,
    retrieval_answer: Option<&str>,
) -> Vec<ChatMessage> {
    let replayed = history.map_or(0, HistoryWindow::len);
    let mut messages = Vec::with_capacity(2 + replayed * 2);

    messages.push(ChatMessage::system(system_prompt));

    if let Some(window) = history {
        for exchange in window.exchanges() {
            messages.push(ChatMessage::user(exchange.user_message.clone()));
            messages.push(ChatMessage::assistant(exchange.assistant_message.clone()));
        }
    }

    messages.push(ChatMessage::user(frame_retrieval(retrieval_answer)));
    messages
}

/// Statistics about an assembled prompt.
#[derive(Debug, Clone)]
pub struct PromptStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub total_characters: usize,
}

impl PromptStats {
    #[must_use]
    pub fn of(messages: &[ChatMessage]) -> Self {
        Self {
            total_messages: messages.len(),
            user_messages: messages.iter().filter(|m| m.role == Role::User).count(),
            assistant_messages: messages
                .iter()
                .filter(|m| m.role == Role::Assistant)
                .count(),
            total_characters: messages.iter().map(|m| m.content.chars().count()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kefu_core::Exchange;

    fn window(pairs: &[(&str, &str)]) -> HistoryWindow {
        // Newest first, as the store returns them.
        HistoryWindow::collect(
            pairs
                .iter()
                .map(|(u, a)| Exchange::new("u1", "jd", *u, *a))
                .collect::<Vec<_>>(),
            10,
            10_000,
        )
    }

    #[test]
    fn test_history_config_default() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_count, 5);
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_history_config_partial_json() {
        let config = serde_json::from_str::<HistoryConfig>(r#"{"max_tokens": 200}"#);
        assert!(config.is_ok(), "partial history config must parse: {config:?}");
        if let Ok(config) = config {
            assert_eq!(config.max_count, 5);
            assert_eq!(config.max_tokens, 200);
        }
    }

    #[test]
    fn test_build_without_history() {
        let messages = build_llm_messages("sys", None, Some("context A"));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("sys"));
        assert_eq!(
            messages[1].content,
            "RAG Results: context A\nPlease provide a response based on all available information."
        );
    }

    #[test]
    fn test_build_replays_history_in_window_order() {
        let history = window(&[("q2", "a2"), ("q1", "a1")]);
        let messages = build_llm_messages("sys", Some(&history), Some("ctx"));

        let roles: Vec<Role> = messages.iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(messages[1].content, "q2");
        assert_eq!(messages[2].content, "a2");
        assert_eq!(messages[3].content, "q1");
        assert_eq!(messages[4].content, "a1");
    }

    #[test]
    fn test_missing_answer_frames_empty_context() {
        assert!(frame_retrieval(None).starts_with("RAG Results: \n"));
    }

    #[test]
    fn test_prompt_stats() {
        let history = window(&[("q1", "a1")]);
        let stats = PromptStats::of(&build_llm_messages("sys", Some(&history), None));

        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.user_messages, 2);
        assert_eq!(stats.assistant_messages, 1);
        assert!(stats.total_characters > 0);
    }
}
