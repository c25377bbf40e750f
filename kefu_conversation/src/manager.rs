//! Conversation coordinator.
//!
//! The `ConversationManager` sequences the history store, the retrieval
//! service and the language model into one persisted exchange per turn.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use kefu_core::{
    DEFAULT_SYSTEM_PROMPT, Exchange, HistoryStore, HistoryWindow, LLMProvider, RetrievalService,
};
use tracing::{debug, error, info, warn};

use crate::error::ConversationError;
use crate::history::{HistoryConfig, PromptStats, build_llm_messages};
use crate::identity::{Identity, InboundMessage};
use crate::session::{ConversationSession, SessionState};

/// Configuration for conversation management.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Model to use for completions
    pub model: String,
    /// System prompt
    pub system_prompt: String,
    /// Bounds for the history window fetched at session start
    pub history: HistoryConfig,
    /// Identity used when the first message carries no markers
    pub default_identity: Identity,
    /// Input line that ends an interactive session
    pub quit_keyword: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: "glm4:latest".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history: HistoryConfig::default(),
            default_identity: Identity::default(),
            quit_keyword: "quit".to_string(),
        }
    }
}

impl ConversationConfig {
    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Set the history window bounds.
    #[must_use]
    pub const fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    /// Set the identity used when markers are missing.
    #[must_use]
    pub fn with_default_identity(mut self, identity: Identity) -> Self {
        self.default_identity = identity;
        self
    }
}

/// Result of processing a conversation turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// Assistant's reply
    pub reply: String,
    /// User text after identity markers were removed
    pub sanitized_input: String,
    /// Answer from the retrieval service, if one could be parsed
    pub retrieval_answer: Option<String>,
    /// Past exchanges replayed into this turn's prompt
    pub replayed_history: usize,
    /// Token usage information
    pub usage: Option<TurnUsage>,
    /// Turn number within the session, starting at 1
    pub turn_number: usize,
}

/// Token usage information for a turn.
#[derive(Debug, Clone)]
pub struct TurnUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

/// Coordinator for one conversation session.
///
/// Turns are processed strictly one at a time (`&mut self`). The first turn
/// binds the session identity, loads the history window and opens a
/// retrieval session; every later turn reuses them.
pub struct ConversationManager<
    P = Arc<dyn LLMProvider>,
    H = Arc<dyn HistoryStore>,
    R = Arc<dyn RetrievalService>,
> where
    P: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
{
    provider: P,
    history_store: H,
    retrieval: R,
    config: ConversationConfig,
    state: SessionState,
}

impl<P, H, R> ConversationManager<P, H, R>
where
    P: LLMProvider + Send + Sync,
    H: HistoryStore + Send + Sync,
    R: RetrievalService + Send + Sync,
{
    /// Create a coordinator. No external call is made until the first turn.
    pub fn new(provider: P, history_store: H, retrieval: R, config: ConversationConfig) -> Self {
        info!("Creating conversation manager (model: {})", config.model);
        Self {
            provider,
            history_store,
            retrieval,
            config,
            state: SessionState::Uninitialized,
        }
    }

    /// Process raw text that may carry `user_id:` / `platform:` markers.
    ///
    /// Markers are only read on the session's first turn; afterwards the
    /// bound identity is used to strip them.
    pub async fn process_raw(&mut self, raw: &str) -> Result<TurnResult, ConversationError> {
        let identity = self.state.identity().cloned().unwrap_or_else(|| {
            let identity = Identity::extract_with(raw, &self.config.default_identity);
            debug!(
                "Extracted identity {}@{}",
                identity.user_id, identity.platform
            );
            identity
        });

        let text = identity.strip_markers(raw);
        self.process_message(InboundMessage { identity, text })
            .await
    }

    /// Process a structured message.
    ///
    /// The first message binds the session; a later message for a different
    /// identity is rejected with [`ConversationError::SessionMismatch`].
    pub async fn process_message(
        &mut self,
        message: InboundMessage,
    ) -> Result<TurnResult, ConversationError> {
        let mut session = self.acquire_session(&message.identity).await?;
        let result = self.run_turn(&mut session, message.text).await;
        self.state = SessionState::Ready(session);
        result
    }

    /// Run an interactive conversation loop on stdin/stdout.
    pub async fn run_interactive(&mut self) -> Result<usize, ConversationError> {
        self.run_loop(BufReader::new(std::io::stdin()), std::io::stdout())
            .await
    }

    /// Read lines from `input` and answer each on `output` until the quit
    /// keyword or end of input. Returns the number of successful turns.
    ///
    /// A failed turn is reported and the loop continues.
    pub async fn run_loop<I, O>(
        &mut self,
        mut input: I,
        mut output: O,
    ) -> Result<usize, ConversationError>
    where
        I: BufRead + Send,
        O: Write + Send,
    {
        writeln!(
            output,
            "Type '{}' to end the session.\n",
            self.config.quit_keyword
        )?;

        let mut completed = 0_usize;
        loop {
            write!(output, "User: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            if line.eq_ignore_ascii_case(&self.config.quit_keyword) {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match self.process_raw(line).await {
                Ok(result) => {
                    writeln!(output, "Assistant: {}\n", result.reply)?;
                    completed += 1;

                    if let Some(usage) = result.usage {
                        debug!(
                            "Tokens: {} prompt + {} completion = {} total",
                            usage.prompt, usage.completion, usage.total
                        );
                    }
                }
                Err(e) => {
                    error!("Turn failed: {e}");
                    writeln!(output, "Error: {e}\n")?;
                }
            }
        }

        info!("Session ended after {completed} turns");
        Ok(completed)
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// The ready session, if initialization has succeeded.
    #[must_use]
    pub const fn session(&self) -> Option<&ConversationSession> {
        self.state.session()
    }

    #[must_use]
    pub const fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Take the session out of `self.state` for the duration of a turn,
    /// initializing it on first use.
    async fn acquire_session(
        &mut self,
        identity: &Identity,
    ) -> Result<ConversationSession, ConversationError> {
        match std::mem::take(&mut self.state) {
            SessionState::Ready(session) => {
                if session.identity == *identity {
                    Ok(session)
                } else {
                    let err = ConversationError::SessionMismatch {
                        bound: format!("{}@{}", session.user_id(), session.platform()),
                        received: format!("{}@{}", identity.user_id, identity.platform),
                    };
                    self.state = SessionState::Ready(session);
                    Err(err)
                }
            }
            SessionState::Unusable { identity, reason } => {
                let err = ConversationError::SessionUnusable {
                    user_id: identity.user_id.clone(),
                    platform: identity.platform.clone(),
                    reason: reason.clone(),
                };
                self.state = SessionState::Unusable { identity, reason };
                Err(err)
            }
            SessionState::Uninitialized => match self.initialize(identity).await {
                Ok(session) => Ok(session),
                Err(e) => {
                    warn!("Session initialization failed, session is now unusable: {e}");
                    self.state = SessionState::Unusable {
                        identity: identity.clone(),
                        reason: e.to_string(),
                    };
                    Err(e)
                }
            },
        }
    }

    /// Fetch the history window and open a retrieval session.
    async fn initialize(&self, identity: &Identity) -> Result<ConversationSession, ConversationError> {
        info!(
            "Initializing session for {}@{}",
            identity.user_id, identity.platform
        );

        let history = self.history_store.query_recent(
            &identity.user_id,
            &identity.platform,
            self.config.history.max_count,
            self.config.history.max_tokens,
        );
        let retrieval_session = self.retrieval.create_session(&identity.user_id);

        let (window, retrieval_session_id) = tokio::try_join!(history, retrieval_session)
            .map_err(|source| ConversationError::Initialization {
                user_id: identity.user_id.clone(),
                platform: identity.platform.clone(),
                source,
            })?;

        info!(
            "Session ready: {} past exchanges ({} tokens), retrieval session {}",
            window.len(),
            window.total_tokens(),
            retrieval_session_id
        );

        Ok(ConversationSession::new(
            identity.clone(),
            retrieval_session_id,
            window,
        ))
    }

    /// retrieve -> assemble + generate -> persist
    async fn run_turn(
        &self,
        session: &mut ConversationSession,
        text: String,
    ) -> Result<TurnResult, ConversationError> {
        let turn_number = session.turns + 1;
        info!(
            "Processing turn {turn_number} for {}@{}",
            session.user_id(),
            session.platform()
        );

        let retrieval_answer = self
            .retrieval
            .query(&session.retrieval_session_id, &text)
            .await
            .map_err(ConversationError::Retrieval)?;
        if retrieval_answer.is_none() {
            warn!("No retrieval answer available, generating with empty context");
        }

        let history = session.take_history_for_replay();
        let replayed_history = history.map_or(0, HistoryWindow::len);
        let messages = build_llm_messages(
            &self.config.system_prompt,
            history,
            retrieval_answer.as_deref(),
        );

        let stats = PromptStats::of(&messages);
        debug!(
            "Prompt: {} messages ({} replayed exchanges), {} chars",
            stats.total_messages, replayed_history, stats.total_characters
        );

        let response = self
            .provider
            .chat(&messages, &self.config.model)
            .await
            .map_err(ConversationError::Generation)?;

        let exchange = Exchange::new(
            session.user_id(),
            session.platform(),
            text.clone(),
            response.content.clone(),
        );
        if let Err(source) = self.history_store.append(&exchange).await {
            return Err(ConversationError::Persistence {
                reply: response.content,
                source,
            });
        }

        session.turns = turn_number;
        debug!("Turn {turn_number} completed successfully");

        Ok(TurnResult {
            reply: response.content,
            sanitized_input: text,
            retrieval_answer,
            replayed_history,
            usage: response.usage.map(|u| TurnUsage {
                prompt: u.prompt_tokens,
                completion: u.completion_tokens,
                total: u.total_tokens,
            }),
            turn_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ConversationConfig::default();
        assert_eq!(config.model, "glm4:latest");
        assert_eq!(config.history, HistoryConfig::default());
        assert_eq!(config.default_identity, Identity::new("user_123", "taobao"));
        assert_eq!(config.quit_keyword, "quit");
    }

    #[test]
    fn test_config_builders() {
        let config = ConversationConfig::default()
            .with_model("glm-4-flash".to_string())
            .with_system_prompt("Be brief.".to_string())
            .with_history(HistoryConfig::default().with_max_count(2))
            .with_default_identity(Identity::new("guest", "web"));

        assert_eq!(config.model, "glm-4-flash");
        assert_eq!(config.system_prompt, "Be brief.");
        assert_eq!(config.history.max_count, 2);
        assert_eq!(config.default_identity.platform, "web");
    }
}
