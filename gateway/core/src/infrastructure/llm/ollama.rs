// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Ollama LLM Provider Adapter
//
// Anti-Corruption Layer for Ollama local models
// Supports air-gapped deployments with local LLMs

use crate::domain::llm::{
    ChatCompletion, ChatMessage, CompletionChoice, EmbeddingResponse, GenerationOptions, LLMError,
    LLMProvider, ModelDescriptor, Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{endpoint, error_from_response, map_finish_reason, network_error, parse_error};

pub struct OllamaAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
    #[serde(default)]
    modified_at: Option<String>,
}

impl OllamaAdapter {
    /// Local servers need no key; one is forwarded when a proxy in front
    /// of Ollama expects it.
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaAdapter {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError> {
        let request = OllamaRequest {
            model: &options.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
                top_p: options.top_p,
                top_k: options.top_k,
                frequency_penalty: options.frequency_penalty,
                presence_penalty: options.presence_penalty,
            },
        };

        let url = endpoint(&self.endpoint, "api/chat");

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &options.model).await);
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(parse_error)?;

        let finish_reason = match ollama_response.done_reason.as_deref() {
            Some(reason) => map_finish_reason(Some(reason)),
            None if ollama_response.done => map_finish_reason(Some("stop")),
            None => map_finish_reason(Some("length")),
        };

        let choices = ollama_response
            .message
            .map(|m| CompletionChoice {
                message: ChatMessage::new(Role::Assistant, m.content),
                finish_reason,
            })
            .into_iter()
            .collect();

        Ok(ChatCompletion {
            model: ollama_response.model.unwrap_or_else(|| options.model.clone()),
            choices,
            usage: TokenUsage::new(
                ollama_response.prompt_eval_count.unwrap_or(0),
                ollama_response.eval_count.unwrap_or(0),
            ),
        })
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingResponse, LLMError> {
        let request = OllamaEmbedRequest {
            model,
            input: inputs,
        };

        let url = endpoint(&self.endpoint, "api/embed");

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, model).await);
        }

        let parsed: OllamaEmbedResponse = response.json().await.map_err(parse_error)?;

        Ok(EmbeddingResponse {
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            data: parsed.embeddings,
            usage: TokenUsage::new(parsed.prompt_eval_count.unwrap_or(0), 0),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
        let url = endpoint(&self.endpoint, "api/tags");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "models").await);
        }

        let tags: OllamaTags = response.json().await.map_err(parse_error)?;

        Ok(tags
            .models
            .into_iter()
            .map(|tag| {
                let created = tag
                    .modified_at
                    .as_deref()
                    .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
                    .map(|ts| ts.timestamp());
                ModelDescriptor {
                    id: tag.name,
                    object: "model".to_string(),
                    created,
                    owned_by: Some("ollama".to_string()),
                }
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        // Check if Ollama server is running by listing models
        let url = endpoint(&self.endpoint, "api/tags");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(network_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LLMError::Network(format!("HTTP {}", response.status())))
        }
    }

    fn is_usable(&self) -> bool {
        !self.endpoint.is_empty()
    }
}
