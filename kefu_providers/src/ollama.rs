use async_trait::async_trait;
use kefu_core::{ChatMessage, LLMProvider, LLMResponse, Usage, normalize_generation};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::{build_client, join_url};

/// Local Ollama server speaking the `/api/chat` protocol.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(base_url: String) -> Self {
        info!("Creating OllamaProvider at {base_url}");
        Self {
            client: Client::new(),
            base_url,
            default_model: "glm4:latest".to_string(),
        }
    }

    #[must_use]
    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = model;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }
}

fn usage_from(response: &serde_json::Value) -> Option<Usage> {
    let prompt = u32::try_from(response["prompt_eval_count"].as_u64()?).unwrap_or(0);
    let completion = u32::try_from(response["eval_count"].as_u64()?).unwrap_or(0);
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: prompt.saturating_add(completion),
    })
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        info!("Sending request to Ollama: model={}", model);

        let response = self
            .client
            .post(join_url(&self.base_url, "api/chat"))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        // `/api/chat` nests the reply under `message`; `/api/generate`-style
        // servers put it under `response`.
        let payload = response
            .get("message")
            .or_else(|| response.get("response"))
            .unwrap_or(&response);
        let content = normalize_generation(payload);
        debug!("Ollama reply: {} chars", content.chars().count());

        Ok(LLMResponse {
            content,
            usage: usage_from(&response),
        })
    }

    fn get_default_model(&self) -> &str {
        &self.default_model
    }
}
