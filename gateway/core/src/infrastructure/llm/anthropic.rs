// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic LLM Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API.
// System turns are lifted into the top-level `system` field.

use crate::domain::llm::{
    ChatCompletion, ChatMessage, CompletionChoice, GenerationOptions, LLMError, LLMProvider,
    ModelDescriptor, Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{endpoint, error_from_response, map_finish_reason, network_error, parse_error};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicModelList {
    #[serde(default)]
    data: Vec<AnthropicModel>,
}

#[derive(Deserialize)]
struct AnthropicModel {
    id: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl AnthropicAdapter {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, endpoint(&self.endpoint, path))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

/// Split system turns out of the conversation; the rest keeps its order
fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage<'_>>) {
    let mut system_parts = Vec::new();
    let mut turns = Vec::new();
    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(msg.content.as_str()),
            Role::User => turns.push(AnthropicMessage {
                role: "user",
                content: &msg.content,
            }),
            Role::Assistant => turns.push(AnthropicMessage {
                role: "assistant",
                content: &msg.content,
            }),
        }
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, turns)
}

#[async_trait]
impl LLMProvider for AnthropicAdapter {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError> {
        let (system, turns) = split_system(messages);
        if turns.is_empty() {
            return Err(LLMError::InvalidInput(
                "at least one user or assistant message is required".into(),
            ));
        }

        // Penalties have no counterpart in the Messages API
        let request = AnthropicRequest {
            model: &options.model,
            messages: turns,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system,
            top_p: options.top_p,
            top_k: options.top_k,
        };

        let response = self
            .request(reqwest::Method::POST, "v1/messages")
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &options.model).await);
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(parse_error)?;

        let text: String = anthropic_response
            .content
            .iter()
            .filter(|c| c.kind.as_deref().unwrap_or("text") == "text")
            .filter_map(|c| c.text.as_deref())
            .collect();

        // The API answers with a single message; no text blocks means no answer
        let choices = if anthropic_response.content.is_empty() {
            Vec::new()
        } else {
            vec![CompletionChoice {
                message: ChatMessage::new(Role::Assistant, text),
                finish_reason: map_finish_reason(anthropic_response.stop_reason.as_deref()),
            }]
        };

        let usage = anthropic_response.usage.unwrap_or_default();

        Ok(ChatCompletion {
            model: anthropic_response.model.unwrap_or_else(|| options.model.clone()),
            choices,
            usage: TokenUsage::new(usage.input_tokens, usage.output_tokens),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
        let response = self
            .request(reqwest::Method::GET, "v1/models")
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "models").await);
        }

        let list: AnthropicModelList = response.json().await.map_err(parse_error)?;

        Ok(list
            .data
            .into_iter()
            .map(|m| {
                let created = m
                    .created_at
                    .as_deref()
                    .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
                    .map(|ts| ts.timestamp());
                ModelDescriptor {
                    id: m.id,
                    object: "model".to_string(),
                    created,
                    owned_by: Some("anthropic".to_string()),
                }
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        let response = self
            .request(reqwest::Method::GET, "v1/models")
            .send()
            .await
            .map_err(network_error)?;

        if response.status().is_success() {
            Ok(())
        } else if response.status() == 401 || response.status() == 403 {
            Err(LLMError::Authentication("Invalid API key".into()))
        } else {
            Err(LLMError::Network(format!("HTTP {}", response.status())))
        }
    }

    fn is_usable(&self) -> bool {
        !self.api_key.is_empty()
    }
}
