//! In-memory session state.
//!
//! A session binds one (user, platform) pair for the lifetime of the
//! process. It is never persisted; only its exchanges are.

use chrono::{DateTime, Utc};
use kefu_core::HistoryWindow;

use crate::identity::Identity;

/// State of a ready conversation session.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    /// Bound identity
    pub identity: Identity,
    /// Opaque handle issued by the retrieval service
    pub retrieval_session_id: String,
    /// Past exchanges fetched at initialization
    pub history: HistoryWindow,
    /// Set once the history has been replayed into a prompt
    pub has_injected_history: bool,
    /// Completed turns in this process
    pub turns: usize,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ConversationSession {
    #[must_use]
    pub fn new(identity: Identity, retrieval_session_id: String, history: HistoryWindow) -> Self {
        Self {
            identity,
            retrieval_session_id,
            history,
            has_injected_history: false,
            turns: 0,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.identity.platform
    }

    /// Hand out the history window for replay, exactly once.
    ///
    /// Returns `Some` on the first call and `None` forever after.
    pub fn take_history_for_replay(&mut self) -> Option<&HistoryWindow> {
        if self.has_injected_history {
            return None;
        }
        self.has_injected_history = true;
        Some(&self.history)
    }
}

/// Lifecycle of the coordinator's single session.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No turn has been processed yet
    #[default]
    Uninitialized,
    /// Identity bound and collaborators initialized
    Ready(ConversationSession),
    /// Initialization failed; the session cannot serve turns
    Unusable { identity: Identity, reason: String },
}

impl SessionState {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub const fn session(&self) -> Option<&ConversationSession> {
        match self {
            Self::Ready(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Ready(session) => Some(&session.identity),
            Self::Unusable { identity, .. } => Some(identity),
            Self::Uninitialized => None,
        }
    }
}
