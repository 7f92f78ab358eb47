// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wire-level tests for the provider adapters against `mockito` servers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use llm_gateway_core::application::registry::ServiceRegistry;
use llm_gateway_core::domain::gateway_config::GatewayConfig;
use llm_gateway_core::domain::llm::{
    ChatMessage, FinishReason, GenerationOptions, LLMError, LLMProvider, Role,
};
use llm_gateway_core::domain::provider::ProviderKind;
use llm_gateway_core::infrastructure::llm::anthropic::AnthropicAdapter;
use llm_gateway_core::infrastructure::llm::dolibarr::DolibarrAdapter;
use llm_gateway_core::infrastructure::llm::gemini::GeminiAdapter;
use llm_gateway_core::infrastructure::llm::ollama::OllamaAdapter;
use llm_gateway_core::infrastructure::llm::openai::OpenAIAdapter;
use llm_gateway_core::presentation::api::app;
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(Role::System, "be brief"),
        ChatMessage::new(Role::User, "hello"),
    ]
}

#[tokio::test]
async fn test_openai_chat_roundtrip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 64,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}
                ],
                "usage": {"prompt_tokens": 9, "completion_tokens": 1, "total_tokens": 10}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(ProviderKind::OpenAI, server.url(), "sk-test".into());
    let options = GenerationOptions::new("gpt-4o-mini", 64, 0.7);
    let completion = adapter.chat(&conversation(), &options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(completion.model, "gpt-4o-mini-2024-07-18");
    assert_eq!(completion.choices.len(), 1);
    assert_eq!(completion.choices[0].message.content, "hi");
    assert_eq!(completion.choices[0].finish_reason, FinishReason::Stop);
    assert_eq!(completion.usage.total_tokens, 10);
}

#[tokio::test]
async fn test_http_failures_are_classified() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer bad")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key"}}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer busy")
        .with_status(429)
        .create_async()
        .await;

    let options = GenerationOptions::new("mistral-small-latest", 16, 0.3);

    let bad = OpenAIAdapter::new(ProviderKind::Mistral, server.url(), "bad".into());
    let err = bad.chat(&conversation(), &options).await.unwrap_err();
    assert!(matches!(err, LLMError::Authentication(_)), "{err}");

    let busy = OpenAIAdapter::new(ProviderKind::Mistral, server.url(), "busy".into());
    let err = busy.chat(&conversation(), &options).await.unwrap_err();
    assert!(matches!(err, LLMError::RateLimit), "{err}");
}

#[tokio::test]
async fn test_openai_embeddings_keep_input_order() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/embeddings")
        .match_body(Matcher::PartialJson(json!({"input_type": "query"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": "nvidia/nv-embedqa-e5-v5",
                "data": [
                    {"index": 1, "embedding": [0.2, 0.2]},
                    {"index": 0, "embedding": [0.1, 0.1]}
                ],
                "usage": {"prompt_tokens": 4, "total_tokens": 4}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(ProviderKind::Nvidia, server.url(), "nvapi-test".into());
    let inputs = vec!["first".to_string(), "second".to_string()];
    let response = adapter.embed(&inputs, "nvidia/nv-embedqa-e5-v5").await.unwrap();

    assert_eq!(response.data, vec![vec![0.1, 0.1], vec![0.2, 0.2]]);
    assert_eq!(response.usage.prompt_tokens, 4);
}

#[tokio::test]
async fn test_perplexity_models_need_no_network() {
    let adapter = OpenAIAdapter::new(
        ProviderKind::Perplexity,
        "http://127.0.0.1:9".into(),
        "pplx-test".into(),
    );
    let models = adapter.list_models().await.unwrap();
    assert!(models.iter().any(|m| m.id == "sonar"));
}

#[tokio::test]
async fn test_anthropic_lifts_system_prompt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-ant-test")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "system": "be brief",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": "claude-3-5-sonnet-latest",
                "content": [{"type": "text", "text": "Hi."}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 12, "output_tokens": 3}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = AnthropicAdapter::new(server.url(), "sk-ant-test".into());
    let options = GenerationOptions::new("claude-3-5-sonnet-latest", 128, 0.5);
    let completion = adapter.chat(&conversation(), &options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(completion.choices[0].message.content, "Hi.");
    assert_eq!(completion.usage.total_tokens, 15);
}

#[tokio::test]
async fn test_anthropic_empty_content_yields_no_choices() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"model":"claude-3-5-haiku-latest","content":[],"stop_reason":"end_turn"}"#)
        .create_async()
        .await;

    let adapter = AnthropicAdapter::new(server.url(), "sk-ant-test".into());
    let options = GenerationOptions::new("claude-3-5-haiku-latest", 128, 0.5);
    let completion = adapter.chat(&conversation(), &options).await.unwrap();
    assert!(completion.choices.is_empty());
}

#[tokio::test]
async fn test_gemini_generate_content() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_header("x-goog-api-key", "gm-test")
        .match_body(Matcher::PartialJson(json!({
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
            "generationConfig": {"maxOutputTokens": 32}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]}, "finishReason": "MAX_TOKENS"}
                ],
                "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = GeminiAdapter::new(server.url(), "gm-test".into());
    let options = GenerationOptions::new("gemini-1.5-flash", 32, 1.0);
    let completion = adapter.chat(&conversation(), &options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(completion.model, "gemini-1.5-flash");
    assert_eq!(completion.choices[0].message.content, "Hello");
    assert_eq!(completion.choices[0].finish_reason, FinishReason::Length);
    assert_eq!(completion.usage.total_tokens, 6);
}

#[tokio::test]
async fn test_ollama_chat_and_tags() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({
            "model": "llama3.2",
            "stream": false,
            "options": {"num_predict": 50}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": "llama3.2",
                "message": {"role": "assistant", "content": "hey"},
                "done": true,
                "done_reason": "stop",
                "prompt_eval_count": 7,
                "eval_count": 2
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"models":[{"name":"llama3.2:latest","modified_at":"2024-10-01T12:00:00Z"}]}"#)
        .create_async()
        .await;

    let adapter = OllamaAdapter::new(server.url(), None);
    let options = GenerationOptions::new("llama3.2", 50, 0.7);
    let completion = adapter.chat(&conversation(), &options).await.unwrap();
    assert_eq!(completion.choices[0].message.content, "hey");
    assert_eq!(completion.usage.total_tokens, 9);

    let models = adapter.list_models().await.unwrap();
    assert_eq!(models[0].id, "llama3.2:latest");
    assert!(models[0].created.is_some());
    assert!(adapter.health_check().await.is_ok());
}

#[tokio::test]
async fn test_ollama_unknown_model_is_model_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/embed")
        .with_status(404)
        .with_body(r#"{"error":"model \"nope\" not found"}"#)
        .create_async()
        .await;

    let adapter = OllamaAdapter::new(server.url(), None);
    let err = adapter.embed(&["x".to_string()], "nope").await.unwrap_err();
    assert!(matches!(err, LLMError::ModelNotFound(ref m) if m == "nope"), "{err}");
}

#[tokio::test]
async fn test_dolibarr_status_probe() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/index.php/status")
        .match_header("DOLAPIKEY", "dol-key")
        .with_status(200)
        .with_body(r#"{"success":{"code":200,"dolibarr_version":"20.0.0"}}"#)
        .create_async()
        .await;

    let adapter = DolibarrAdapter::new(server.url(), "dol-key".into());
    assert!(adapter.health_check().await.is_ok());
    mock.assert_async().await;

    let options = GenerationOptions::new("none", 1, 0.0);
    let err = adapter.chat(&conversation(), &options).await.unwrap_err();
    assert!(matches!(err, LLMError::Unsupported(_)));
}

#[tokio::test]
async fn test_base_url_override_header_reaches_the_instance() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/index.php/status")
        .match_header("DOLAPIKEY", "caller-key")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    // No Dolibarr instance is configured; the caller supplies both values
    let config = GatewayConfig::default();
    let registry = Arc::new(ServiceRegistry::from_config(&config));
    let router = app(&config, registry);

    let request = Request::builder()
        .uri("/api/v1/dolibarr/status")
        .header("x-api-key", "caller-key")
        .header("x-dolibarr-url", server.url())
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["provider"], json!("dolibarr"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_base_url_override_never_carries_the_configured_key() {
    let mut server = mockito::Server::new_async().await;
    let leaked = server
        .mock("GET", "/models")
        .match_header("authorization", "Bearer sk-server-secret")
        .with_status(200)
        .with_body(r#"{"data":[{"id":"x","object":"model"}]}"#)
        .expect(0)
        .create_async()
        .await;
    let caller = server
        .mock("GET", "/models")
        .match_header("authorization", "Bearer caller-key")
        .with_status(200)
        .with_body(r#"{"data":[{"id":"x","object":"model"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let mut config = GatewayConfig::default();
    config
        .providers
        .get_mut(&ProviderKind::OpenAI)
        .unwrap()
        .api_key = Some("sk-server-secret".into());
    let registry = Arc::new(ServiceRegistry::from_config(&config));
    let router = app(&config, registry);

    // Endpoint without a key is refused before anything is sent
    let request = Request::builder()
        .uri("/api/v1/openai/models")
        .header("x-base-url", server.url())
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], json!("configuration_error"));

    // With the caller's own key the request goes through using that key
    let request = Request::builder()
        .uri("/api/v1/openai/models")
        .header("x-base-url", server.url())
        .header("x-api-key", "caller-key")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    leaked.assert_async().await;
    caller.assert_async().await;
}
