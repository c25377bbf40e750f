use kefu_config::Config;

/// Strategy for initializing the configuration at `~/kefu/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config_path = Config::create_config()?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Pick a provider (providers.kind: \"ollama\" or \"zhipu\")");
        println!("   2. Add your RAGFlow API key (and Zhipu key if used)");
        println!("   3. Run 'kefu chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - agent.history: how many past exchanges the first reply sees");
        println!("   - identity: user and platform used when a message carries no markers");
        println!("   - database.url: SQLite, PostgreSQL or MySQL URL for the history store");
        println!();
        Ok(())
    }
}
