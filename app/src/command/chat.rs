//! Customer-service conversation command.
//!
//! The session binds to the identity found in the first message (or the
//! configured defaults) and lasts until the process exits.

use kefu_conversation::ConversationManager;
use tracing::info;

use super::init_components;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Optional model override
    pub model: Option<String>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let components = init_components().await?;

        let mut conversation_config = components
            .config
            .conversation_config(components.provider.get_default_model());
        if let Some(model) = input.model {
            conversation_config = conversation_config.with_model(model);
        }

        let mut manager = ConversationManager::new(
            components.provider,
            components.history,
            components.retrieval,
            conversation_config,
        );

        if let Some(msg) = input.message {
            let result = manager.process_raw(&msg).await?;
            println!("{}", result.reply);
            info!("Turn {} completed.", result.turn_number);
        } else {
            let turns = manager.run_interactive().await?;
            if let Some(session) = manager.session() {
                info!(
                    "Conversation with {}@{} ended after {turns} turns",
                    session.user_id(),
                    session.platform()
                );
            }
        }

        Ok(())
    }
}
