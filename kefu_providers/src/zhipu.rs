use async_trait::async_trait;
use kefu_core::{ChatMessage, LLMProvider, LLMResponse, Usage, normalize_generation};
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::{build_client, join_url};

/// Zhipu GLM over its OpenAI-compatible chat completions endpoint.
pub struct ZhipuProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ZhipuProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating ZhipuProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }
}

fn usage_from(response: &serde_json::Value) -> Option<Usage> {
    let u = response["usage"].as_object()?;
    let field = |name: &str| u32::try_from(u[name].as_u64().unwrap_or(0)).unwrap_or(0);
    Some(Usage {
        prompt_tokens: field("prompt_tokens"),
        completion_tokens: field("completion_tokens"),
        total_tokens: field("total_tokens"),
    })
}

#[async_trait]
impl LLMProvider for ZhipuProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "model": model,
            "messages": messages,
        });

        info!("Sending request to Zhipu API: model={}", model);

        let response = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let message = response.pointer("/choices/0/message").unwrap_or(&response);
        let content = normalize_generation(message);

        info!("Received response from Zhipu API");
        Ok(LLMResponse {
            content,
            usage: usage_from(&response),
        })
    }

    fn get_default_model(&self) -> &'static str {
        "glm-4-flash"
    }
}
