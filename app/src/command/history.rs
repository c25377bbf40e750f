use kefu_config::Config;
use kefu_history::{HistoryManager, HistoryStore};

/// Input parameters for the History command strategy.
#[derive(Debug, Clone)]
pub struct HistoryInput {
    pub user_id: String,
    pub platform: String,
    /// Overrides `agent.history.max_count`
    pub max_count: Option<usize>,
    /// Overrides `agent.history.max_tokens`
    pub max_tokens: Option<usize>,
}

/// Strategy for printing the history window a new session would replay.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStrategy;

impl super::CommandStrategy for HistoryStrategy {
    type Input = HistoryInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = HistoryManager::new(&config.database.url).await?;

        let max_count = input.max_count.unwrap_or(config.agent.history.max_count);
        let max_tokens = input.max_tokens.unwrap_or(config.agent.history.max_tokens);

        let total = store.count(&input.user_id, &input.platform).await?;
        let window = store
            .query_recent(&input.user_id, &input.platform, max_count, max_tokens)
            .await?;

        println!(
            "{}@{}: {} of {total} stored exchanges fit (max {max_count}, {} / {max_tokens} tokens)\n",
            input.user_id,
            input.platform,
            window.len(),
            window.total_tokens()
        );

        for exchange in window.chronological() {
            println!("[{}]", exchange.timestamp.format("%Y-%m-%d %H:%M:%S"));
            println!("  User: {}", exchange.user_message);
            println!("  Assistant: {}", exchange.assistant_message);
        }

        Ok(())
    }
}
