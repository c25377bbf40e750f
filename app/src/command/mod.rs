//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate strategy type with its own input, so
//! dispatch in `main` is monomorphized.

use std::sync::Arc;

use kefu_config::{Config, ProviderKind};
use kefu_core::LLMProvider;
use kefu_history::HistoryManager;
use kefu_providers::{OllamaProvider, RagflowClient, ZhipuProvider};
use tracing::info;

mod chat;
mod history;
mod info;
mod init;
mod rag;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use history::{HistoryInput, HistoryStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use rag::{RagAction, RagStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Collaborators shared by the commands that run conversations.
pub struct Components {
    pub config: Config,
    pub provider: Arc<dyn LLMProvider>,
    pub history: Arc<HistoryManager>,
    pub retrieval: Arc<RagflowClient>,
}

/// Build the configured language-model adapter.
pub fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let providers = &config.providers;
    let provider: Arc<dyn LLMProvider> = match providers.kind {
        ProviderKind::Ollama => {
            info!("Using Ollama at {}", providers.ollama.base_url);
            Arc::new(
                OllamaProvider::new(providers.ollama.base_url.clone())
                    .with_default_model(providers.ollama.model.clone())
                    .with_timeout(providers.timeout_secs)?,
            )
        }
        ProviderKind::Zhipu => {
            info!("Using Zhipu at {}", providers.zhipu.base_url);
            Arc::new(
                ZhipuProvider::new(providers.zhipu.api_key.clone())
                    .with_base_url(providers.zhipu.base_url.clone())
                    .with_timeout(providers.timeout_secs)?,
            )
        }
    };
    Ok(provider)
}

pub fn build_retrieval(config: &Config) -> anyhow::Result<RagflowClient> {
    RagflowClient::new(config.ragflow.base_url.clone(), config.ragflow.api_key.clone())
        .with_timeout(config.ragflow.timeout_secs)
}

/// Load the config and connect every collaborator.
pub async fn init_components() -> anyhow::Result<Components> {
    let config = Config::load()?;
    info!("Loaded config from ~/kefu/config.json");

    let provider = build_provider(&config)?;
    let retrieval = Arc::new(build_retrieval(&config)?);

    info!("Connecting to database");
    let history = Arc::new(HistoryManager::new(&config.database.url).await?);

    Ok(Components {
        config,
        provider,
        history,
        retrieval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_supplies_default_model() {
        let mut config = Config::default();
        config.providers.ollama.model = "qwen2:7b".to_string();

        let provider = build_provider(&config).unwrap_or_else(|e| panic!("ollama: {e}"));
        assert_eq!(provider.get_default_model(), "qwen2:7b");
        assert_eq!(
            config.conversation_config(provider.get_default_model()).model,
            "qwen2:7b"
        );

        config.providers.kind = ProviderKind::Zhipu;
        let provider = build_provider(&config).unwrap_or_else(|e| panic!("zhipu: {e}"));
        assert_eq!(provider.get_default_model(), "glm-4-flash");
    }

    #[test]
    fn test_agent_model_overrides_provider_default() {
        let mut config = Config::default();
        config.agent.model = Some("glm4:9b".to_string());

        let provider = build_provider(&config).unwrap_or_else(|e| panic!("ollama: {e}"));
        assert_eq!(
            config.conversation_config(provider.get_default_model()).model,
            "glm4:9b"
        );
    }
}
