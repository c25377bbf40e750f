use thiserror::Error;

/// Errors that abort a conversation turn.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Session initialization failed for {user_id}@{platform}: {source}")]
    Initialization {
        user_id: String,
        platform: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Session for {user_id}@{platform} is unusable after failed initialization: {reason}")]
    SessionUnusable {
        user_id: String,
        platform: String,
        reason: String,
    },

    #[error("Session is bound to {bound}, refusing message for {received}")]
    SessionMismatch { bound: String, received: String },

    #[error("Retrieval service error: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("LLM provider error: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("Failed to persist exchange: {source}")]
    Persistence {
        /// Reply that was generated but could not be stored
        reply: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
