//! RAGFlow HTTP client.
//!
//! The turn loop only needs [`RetrievalService`]; the remaining methods back
//! the auxiliary `rag` tooling and return RAGFlow's JSON bodies unchanged.

use anyhow::Context;
use async_trait::async_trait;
use kefu_core::RetrievalService;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{build_client, join_url};

pub struct RagflowClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl RagflowClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        info!("Creating RagflowClient at {base_url}");
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send_json(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let body = request
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(body)
    }

    /// All messages and references recorded for a RAGFlow conversation.
    pub async fn conversation_history(&self, conversation_id: &str) -> anyhow::Result<Value> {
        self.send_json(
            self.client
                .get(self.url(&format!("api/conversation/{conversation_id}"))),
        )
        .await
    }

    pub async fn get_document(&self, document_id: &str) -> anyhow::Result<Value> {
        self.send_json(self.client.get(self.url(&format!("document/get/{document_id}"))))
            .await
    }

    /// Upload a document description (`kb_name`, `parser_id`, `run`, ...).
    pub async fn upload_document(&self, document: &Value) -> anyhow::Result<Value> {
        self.send_json(self.client.post(self.url("api/document/upload")).json(document))
            .await
    }

    pub async fn list_chunks(&self, document_id: &str) -> anyhow::Result<Value> {
        let url = Url::parse_with_params(
            &self.url("api/list_chunks"),
            &[("document_id", document_id)],
        )
        .context("Invalid RAGFlow base URL")?;
        self.send_json(self.client.get(url)).await
    }

    pub async fn list_kb_docs(&self, knowledge_base_id: &str) -> anyhow::Result<Value> {
        self.send_json(
            self.client
                .post(self.url("api/list_kb_docs"))
                .json(&json!({ "knowledge_base_id": knowledge_base_id })),
        )
        .await
    }

    pub async fn delete_document(&self, document_id: &str) -> anyhow::Result<Value> {
        self.send_json(
            self.client
                .delete(self.url("api/document"))
                .json(&json!({ "id": document_id })),
        )
        .await
    }
}

fn retmsg(body: &Value) -> &str {
    body["retmsg"].as_str().unwrap_or("no message")
}

#[async_trait]
impl RetrievalService for RagflowClient {
    async fn create_session(&self, user_id: &str) -> anyhow::Result<String> {
        info!("Creating RAGFlow conversation for user {user_id}");

        let body = self
            .send_json(
                self.client
                    .get(self.url("api/new_conversation"))
                    .json(&json!({ "user_id": user_id })),
            )
            .await
            .context("Failed to create RAGFlow conversation")?;

        let id = body["data"]["id"].as_str().ok_or_else(|| {
            anyhow::anyhow!(
                "RAGFlow new_conversation response has no data.id: {}",
                retmsg(&body)
            )
        })?;

        debug!("RAGFlow conversation id: {id}");
        Ok(id.to_string())
    }

    async fn query(&self, session_id: &str, question: &str) -> anyhow::Result<Option<String>> {
        let request = json!({
            "conversation_id": session_id,
            "messages": [{ "role": "user", "content": question }],
            "stream": false,
        });

        let text = self
            .client
            .post(self.url("api/completion"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) => {
                warn!("RAGFlow completion response is not JSON ({e}), continuing without context");
                return Ok(None);
            }
        };

        let answer = body["data"]["answer"].as_str().ok_or_else(|| {
            anyhow::anyhow!(
                "RAGFlow completion response has no data.answer: {}",
                retmsg(&body)
            )
        })?;

        debug!("RAGFlow answer: {} chars", answer.chars().count());
        Ok(Some(answer.to_string()))
    }
}
