//! Exchange records and the token-bounded history window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed turn: the sanitized user message and the assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    pub id: Uuid,
    pub user_id: String,
    pub platform: String,
    pub user_message: String,
    pub assistant_message: String,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    /// Create an exchange stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        platform: impl Into<String>,
        user_message: impl Into<String>,
        assistant_message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            platform: platform.into(),
            user_message: user_message.into(),
            assistant_message: assistant_message.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn approx_tokens(&self) -> usize {
        approx_tokens(&self.user_message, &self.assistant_message)
    }
}

/// Crude token estimate: character count of both sides of an exchange.
#[must_use]
pub fn approx_tokens(user_message: &str, assistant_message: &str) -> usize {
    user_message.chars().count() + assistant_message.chars().count()
}

/// Most-recent-first slice of exchanges that fits a token budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryWindow {
    exchanges: Vec<Exchange>,
    total_tokens: usize,
}

impl HistoryWindow {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            exchanges: Vec::new(),
            total_tokens: 0,
        }
    }

    /// Build a window from exchanges ordered newest first.
    ///
    /// Takes at most `max_count` exchanges and stops at the first one that
    /// would push the running total past `max_tokens`. Exchanges are never
    /// split, and nothing older than the overflowing exchange is included.
    pub fn collect<I>(recent_first: I, max_count: usize, max_tokens: usize) -> Self
    where
        I: IntoIterator<Item = Exchange>,
    {
        let mut window = Self::empty();

        for exchange in recent_first.into_iter().take(max_count) {
            let tokens = exchange.approx_tokens();
            if window.total_tokens + tokens > max_tokens {
                break;
            }
            window.total_tokens += tokens;
            window.exchanges.push(exchange);
        }

        window
    }

    /// Exchanges, newest first.
    #[must_use]
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Exchanges, oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().rev()
    }

    #[must_use]
    pub const fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(user: &str, assistant: &str) -> Exchange {
        Exchange::new("u1", "jd", user, assistant)
    }

    #[test]
    fn approx_tokens_counts_chars_not_bytes() {
        assert_eq!(approx_tokens("你好", "ok"), 4);
        assert_eq!(approx_tokens("", ""), 0);
    }

    #[test]
    fn test_window_stops_at_budget() {
        // 100 + 100 + 100 fits in 350, the fourth would not.
        let stored: Vec<Exchange> = (0..5)
            .map(|i| exchange(&format!("{i}{}", "u".repeat(49)), &"a".repeat(50)))
            .collect();

        let window = HistoryWindow::collect(stored.clone(), 5, 350);

        assert_eq!(window.len(), 3);
        assert_eq!(window.total_tokens(), 300);
        assert_eq!(window.exchanges(), &stored[..3]);
    }

    #[test]
    fn test_window_drops_tail_after_overflow() {
        // A small exchange after an overflowing one must not be picked up.
        let stored = vec![
            exchange("aaaa", "bbbb"),
            exchange(&"x".repeat(500), "y"),
            exchange("c", "d"),
        ];

        let window = HistoryWindow::collect(stored, 5, 100);

        assert_eq!(window.len(), 1);
        assert_eq!(window.exchanges()[0].user_message, "aaaa");
    }

    #[test]
    fn test_window_respects_max_count() {
        let stored: Vec<Exchange> = (0..10).map(|i| exchange(&i.to_string(), "a")).collect();

        let window = HistoryWindow::collect(stored, 5, 10_000);

        assert_eq!(window.len(), 5);
        assert_eq!(window.exchanges()[0].user_message, "0");
        assert_eq!(window.exchanges()[4].user_message, "4");
    }

    #[test]
    fn test_chronological_reverses_order() {
        let stored = vec![exchange("newest", "a"), exchange("oldest", "b")];
        let window = HistoryWindow::collect(stored, 5, 1000);

        let order: Vec<&str> = window
            .chronological()
            .map(|e| e.user_message.as_str())
            .collect();
        assert_eq!(order, vec!["oldest", "newest"]);
    }

    #[test]
    fn test_zero_budget_is_empty() {
        let window = HistoryWindow::collect(vec![exchange("a", "b")], 5, 0);
        assert!(window.is_empty());
    }
}
