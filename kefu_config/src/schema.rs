use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kefu_conversation::{ConversationConfig, HistoryConfig, Identity};
use kefu_core::{DEFAULT_PLATFORM, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_ID};

const CONFIG_DIR: &str = "kefu";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub ragflow: RagflowConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    /// Overrides the selected provider's default model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "AgentConfig::default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: Self::default_system_prompt(),
            history: HistoryConfig::default(),
        }
    }
}

impl AgentConfig {
    fn default_system_prompt() -> String {
        DEFAULT_SYSTEM_PROMPT.to_string()
    }
}

/// Identity bound when a first message carries no markers.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IdentityConfig {
    #[serde(default = "IdentityConfig::default_user_id")]
    pub default_user_id: String,
    #[serde(default = "IdentityConfig::default_platform")]
    pub default_platform: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_user_id: Self::default_user_id(),
            default_platform: Self::default_platform(),
        }
    }
}

impl IdentityConfig {
    fn default_user_id() -> String {
        DEFAULT_USER_ID.to_string()
    }

    fn default_platform() -> String {
        DEFAULT_PLATFORM.to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Zhipu,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub zhipu: ZhipuConfig,
    /// Per-request timeout; no timeout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "OllamaConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "OllamaConfig::default_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
        }
    }
}

impl OllamaConfig {
    fn default_base_url() -> String {
        "http://localhost:11434".to_string()
    }

    fn default_model() -> String {
        "glm4:latest".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ZhipuConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "ZhipuConfig::default_base_url")]
    pub base_url: String,
}

impl Default for ZhipuConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
        }
    }
}

impl ZhipuConfig {
    fn default_base_url() -> String {
        "https://open.bigmodel.cn/api/paas/v4".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RagflowConfig {
    #[serde(default = "RagflowConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for RagflowConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: String::new(),
            timeout_secs: None,
        }
    }
}

impl RagflowConfig {
    fn default_base_url() -> String {
        "http://localhost/v1".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    /// SQLite file next to the config, created on first use.
    fn default_url() -> String {
        dirs::home_dir().map_or_else(
            || "sqlite://kefu_history.db?mode=rwc".to_string(),
            |home| {
                format!(
                    "sqlite://{}?mode=rwc",
                    home.join(CONFIG_DIR).join("history.db").display()
                )
            },
        )
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'kefu init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Write a config file populated with every default. Refuses to
    /// overwrite an existing file.
    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::ensure_config_dir()?.join(CONFIG_FILE);
        Self::write_template(&config_path)?;
        Ok(config_path)
    }

    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }

        let template = serde_json::to_string_pretty(&Self::template())?;
        std::fs::write(path, template)?;
        Ok(())
    }

    /// Defaults with placeholder secrets, as written by `kefu init`.
    #[must_use]
    pub fn template() -> Self {
        let mut config = Self::default();
        config.providers.zhipu.api_key = "your-zhipu-api-key-here".to_string();
        config.ragflow.api_key = "your-ragflow-api-key-here".to_string();
        config
    }

    /// `agent.model` when set, otherwise the provider's own default.
    #[must_use]
    pub fn model_or(&self, provider_default: &str) -> String {
        self.agent
            .model
            .clone()
            .unwrap_or_else(|| provider_default.to_string())
    }

    #[must_use]
    pub fn conversation_config(&self, provider_default_model: &str) -> ConversationConfig {
        ConversationConfig::default()
            .with_model(self.model_or(provider_default_model))
            .with_system_prompt(self.agent.system_prompt.clone())
            .with_history(self.agent.history)
            .with_default_identity(Identity::new(
                self.identity.default_user_id.clone(),
                self.identity.default_platform.clone(),
            ))
    }

    /// Copy of this config with secrets masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.providers.zhipu.api_key = mask_secret(&config.providers.zhipu.api_key);
        config.ragflow.api_key = mask_secret(&config.ragflow.api_key);
        config
    }
}

/// Keep the first and last four characters of a secret.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
