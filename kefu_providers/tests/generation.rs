//! Generation adapters against a mock HTTP server.

use kefu_core::{ChatMessage, LLMProvider};
use kefu_providers::{OllamaProvider, ZhipuProvider};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prompt() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user("RAG Results: context A"),
    ]
}

#[tokio::test]
async fn test_ollama_chat_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "glm4:latest",
            "stream": false,
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "RAG Results: context A" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "glm4:latest",
            "message": { "role": "assistant", "content": "reply X" },
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 3
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri());
    let response = provider
        .chat(&prompt(), provider.get_default_model())
        .await
        .expect("chat failed");

    assert_eq!(response.content, "reply X");
    let usage = response.usage.expect("usage missing");
    assert_eq!(usage.total_tokens, 15);
}

#[tokio::test]
async fn test_ollama_plain_string_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "reply X"
        })))
        .mount(&server)
        .await;

    let response = OllamaProvider::new(server.uri())
        .chat(&prompt(), "glm4:latest")
        .await
        .expect("chat failed");

    assert_eq!(response.content, "reply X");
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn test_ollama_unknown_shape_falls_back_to_json_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "parts": ["a"] }
        })))
        .mount(&server)
        .await;

    let response = OllamaProvider::new(server.uri())
        .chat(&prompt(), "glm4:latest")
        .await
        .expect("unknown shapes are not errors");

    assert_eq!(response.content, r#"{"parts":["a"]}"#);
}

#[tokio::test]
async fn test_ollama_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = OllamaProvider::new(server.uri())
        .chat(&prompt(), "glm4:latest")
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_zhipu_chat_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer zhipu-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "reply X" } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 }
        })))
        .mount(&server)
        .await;

    let response = ZhipuProvider::new("zhipu-key".to_string())
        .with_base_url(server.uri())
        .chat(&prompt(), "glm-4-flash")
        .await
        .expect("chat failed");

    assert_eq!(response.content, "reply X");
    assert_eq!(response.usage.map(|u| u.total_tokens), Some(12));
}
