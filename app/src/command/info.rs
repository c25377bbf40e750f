use std::fmt::Write as _;

use kefu_config::{Config, ProviderKind};
use kefu_history::HistoryManager;
use tracing::info;

use super::build_provider;

/// Strategy for displaying configuration information.
///
/// Secrets and database passwords are masked.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let provider = build_provider(&config)?;
        let model = config.model_or(provider.get_default_model());

        println!("=== kefu Configuration ===\n");
        print!("{}", report(&config.redacted(), &model));

        println!("Database:");
        let db_url = &config.database.url;
        println!("  URL: {}", mask_database_url(db_url));

        info!("Testing database connection");
        match HistoryManager::new(db_url).await {
            Ok(_) => {
                println!("  Status: Connected");
            }
            Err(e) => {
                println!("  Status: Connection failed");
                println!("  Error: {e}");
            }
        }

        Ok(())
    }
}

/// Provider, RAGFlow and conversation sections. Expects a redacted config.
fn report(config: &Config, model: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Provider:");
    match config.providers.kind {
        ProviderKind::Ollama => {
            let _ = writeln!(out, "  Kind: ollama");
            let _ = writeln!(out, "  Base URL: {}", config.providers.ollama.base_url);
        }
        ProviderKind::Zhipu => {
            let _ = writeln!(out, "  Kind: zhipu");
            let _ = writeln!(out, "  Base URL: {}", config.providers.zhipu.base_url);
            let _ = writeln!(out, "  API Key: {}", config.providers.zhipu.api_key);
        }
    }
    let _ = writeln!(out, "  Model: {model}");
    let _ = writeln!(out, "  Timeout: {}\n", format_timeout(config.providers.timeout_secs));

    let _ = writeln!(out, "RAGFlow:");
    let _ = writeln!(out, "  Base URL: {}", config.ragflow.base_url);
    let _ = writeln!(out, "  API Key: {}", config.ragflow.api_key);
    let _ = writeln!(out, "  Timeout: {}\n", format_timeout(config.ragflow.timeout_secs));

    let _ = writeln!(out, "Conversation:");
    let _ = writeln!(out, "  History Max Count: {}", config.agent.history.max_count);
    let _ = writeln!(out, "  History Max Tokens: {}", config.agent.history.max_tokens);
    let _ = writeln!(
        out,
        "  Default Identity: {}@{}",
        config.identity.default_user_id, config.identity.default_platform
    );
    let _ = writeln!(
        out,
        "  System Prompt: {}\n",
        truncate(&config.agent.system_prompt, 60)
    );

    out
}

fn format_timeout(timeout_secs: Option<u64>) -> String {
    timeout_secs.map_or_else(|| "none".to_string(), |secs| format!("{secs}s"))
}

fn mask_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    let Some((credentials, after_at)) = rest.split_once('@') else {
        return url.to_string();
    };

    let Some((username, _password)) = credentials.split_once(':') else {
        return url.to_string();
    };

    format!("{scheme}://{username}:***@{after_at}")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
