// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI LLM Provider Adapter
//
// Anti-Corruption Layer for the OpenAI chat-completions API.
// Also serves the OpenAI-compatible providers: Mistral, NVIDIA NIM and
// Perplexity differ only in endpoint, accepted parameters and catalogue.

use crate::domain::llm::{
    ChatCompletion, ChatMessage, CompletionChoice, EmbeddingResponse, GenerationOptions, LLMError,
    LLMProvider, ModelDescriptor, Role, TokenUsage,
};
use crate::domain::provider::ProviderKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{endpoint, error_from_response, map_finish_reason, network_error, parse_error};

// Perplexity publishes no models endpoint
const PERPLEXITY_MODELS: &[&str] = &[
    "sonar",
    "sonar-pro",
    "sonar-reasoning",
    "sonar-reasoning-pro",
    "sonar-deep-research",
];

pub struct OpenAIAdapter {
    client: reqwest::Client,
    provider: ProviderKind,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    data: Vec<OpenAIEmbedding>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Deserialize)]
struct OpenAIModelList {
    #[serde(default)]
    data: Vec<OpenAIModel>,
}

#[derive(Deserialize)]
struct OpenAIModel {
    id: String,
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    owned_by: Option<String>,
}

impl OpenAIAdapter {
    pub fn new(provider: ProviderKind, endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
            endpoint,
            api_key,
        }
    }

    // OpenAI and Mistral reject unknown sampling parameters
    fn accepts_top_k(&self) -> bool {
        matches!(self.provider, ProviderKind::Perplexity | ProviderKind::Nvidia)
    }
}

#[async_trait]
impl LLMProvider for OpenAIAdapter {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError> {
        let request = OpenAIRequest {
            model: &options.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k.filter(|_| self.accepts_top_k()),
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            stream: false,
        };

        let url = endpoint(&self.endpoint, "chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &options.model).await);
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(parse_error)?;

        let usage = openai_response.usage.unwrap_or_default();
        let choices = openai_response
            .choices
            .into_iter()
            .map(|choice| CompletionChoice {
                message: ChatMessage::new(Role::Assistant, choice.message.content.unwrap_or_default()),
                finish_reason: map_finish_reason(choice.finish_reason.as_deref()),
            })
            .collect();

        Ok(ChatCompletion {
            model: openai_response.model.unwrap_or_else(|| options.model.clone()),
            choices,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingResponse, LLMError> {
        let request = OpenAIEmbeddingRequest {
            model,
            input: inputs,
            encoding_format: "float",
            // NIM retrieval models need to know which side of the query they embed
            input_type: (self.provider == ProviderKind::Nvidia).then_some("query"),
        };

        let url = endpoint(&self.endpoint, "embeddings");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, model).await);
        }

        let mut parsed: OpenAIEmbeddingResponse = response.json().await.map_err(parse_error)?;
        parsed.data.sort_by_key(|e| e.index);
        let usage = parsed.usage.unwrap_or_default();

        Ok(EmbeddingResponse {
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            data: parsed.data.into_iter().map(|e| e.embedding).collect(),
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: 0,
                total_tokens: usage.total_tokens.max(usage.prompt_tokens),
            },
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
        if self.provider == ProviderKind::Perplexity {
            return Ok(PERPLEXITY_MODELS
                .iter()
                .map(|id| ModelDescriptor::new(*id, Some("perplexity".to_string())))
                .collect());
        }

        let url = endpoint(&self.endpoint, "models");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "models").await);
        }

        let list: OpenAIModelList = response.json().await.map_err(parse_error)?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelDescriptor {
                id: m.id,
                object: m.object.unwrap_or_else(|| "model".to_string()),
                created: m.created,
                owned_by: m.owned_by,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        // Simple check - try to list models endpoint
        let url = endpoint(&self.endpoint, "models");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        // Perplexity has no catalogue route; any answer other than an auth
        // rejection proves the endpoint and key are usable
        let reachable = status.is_success()
            || (self.provider == ProviderKind::Perplexity && (status == 404 || status == 405));

        if reachable {
            Ok(())
        } else if status == 401 || status == 403 {
            Err(LLMError::Authentication("Invalid API key".into()))
        } else {
            Err(LLMError::Network(format!("HTTP {}", status)))
        }
    }

    fn is_usable(&self) -> bool {
        !self.api_key.is_empty() && !self.endpoint.is_empty()
    }
}
