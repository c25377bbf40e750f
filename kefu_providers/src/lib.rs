#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! HTTP adapters for the external collaborators: the language model
//! (Ollama, Zhipu) and the RAGFlow retrieval backend.

use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

mod ollama;
mod ragflow;
mod zhipu;

pub use ollama::OllamaProvider;
pub use ragflow::RagflowClient;
pub use zhipu::ZhipuProvider;

/// Build an HTTP client, optionally bounded by a per-request timeout.
///
/// Without a timeout a hung backend blocks the caller indefinitely.
pub(crate) fn build_client(timeout_secs: Option<u64>) -> anyhow::Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to create HTTP client")
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_collapses_slashes() {
        assert_eq!(
            join_url("http://localhost/v1/", "/api/completion"),
            "http://localhost/v1/api/completion"
        );
        assert_eq!(
            join_url("http://localhost:11434", "api/chat"),
            "http://localhost:11434/api/chat"
        );
    }
}
