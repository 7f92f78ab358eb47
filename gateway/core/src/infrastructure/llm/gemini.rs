// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gemini LLM Provider Adapter
//
// Anti-Corruption Layer for the Google Generative Language API.
// Assistant turns use the `model` role; system turns go to systemInstruction.

use crate::domain::llm::{
    ChatCompletion, ChatMessage, CompletionChoice, EmbeddingResponse, GenerationOptions, LLMError,
    LLMProvider, ModelDescriptor, Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{endpoint, error_from_response, map_finish_reason, network_error, parse_error};

pub struct GeminiAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
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
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Serialize)]
struct GeminiEmbedBatch<'a> {
    requests: Vec<GeminiEmbedRequest<'a>>,
}

#[derive(Serialize)]
struct GeminiEmbedRequest<'a> {
    model: String,
    content: GeminiContent<'a>,
}

#[derive(Deserialize)]
struct GeminiEmbedResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbedding>,
}

#[derive(Deserialize)]
struct GeminiEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Deserialize)]
struct GeminiModel {
    name: String,
}

impl GeminiAdapter {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    fn model_path(model: &str) -> String {
        format!("models/{}", strip_model_prefix(model))
    }

    /// `{endpoint}/models/{id}:{action}`. The id is percent-encoded as a
    /// single path segment so it cannot change the upstream route.
    fn model_url(&self, model: &str, action: &str) -> Result<String, LLMError> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| LLMError::InvalidInput(format!("Invalid Gemini endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| LLMError::InvalidInput("Gemini endpoint cannot take a path".into()))?
            .pop_if_empty()
            .push("models")
            .push(&format!("{}:{}", strip_model_prefix(model), action));
        Ok(url.to_string())
    }
}

/// Catalogue names come back as "models/<id>"
fn strip_model_prefix(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

fn build_contents(messages: &[ChatMessage]) -> (Option<GeminiContent<'_>>, Vec<GeminiContent<'_>>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();
    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(GeminiPart { text: &msg.content }),
            Role::User => contents.push(GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: &msg.content }],
            }),
            Role::Assistant => contents.push(GeminiContent {
                role: Some("model"),
                parts: vec![GeminiPart { text: &msg.content }],
            }),
        }
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(GeminiContent {
            role: None,
            parts: system_parts,
        })
    };
    (system, contents)
}

#[async_trait]
impl LLMProvider for GeminiAdapter {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError> {
        let (system_instruction, contents) = build_contents(messages);
        if contents.is_empty() {
            return Err(LLMError::InvalidInput(
                "at least one user or assistant message is required".into(),
            ));
        }

        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                top_p: options.top_p,
                top_k: options.top_k,
                frequency_penalty: options.frequency_penalty,
                presence_penalty: options.presence_penalty,
            },
        };

        let url = self.model_url(&options.model, "generateContent")?;

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &options.model).await);
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(parse_error)?;

        let choices = gemini_response
            .candidates
            .into_iter()
            .map(|candidate| {
                let text: String = candidate
                    .content
                    .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                    .unwrap_or_default();
                CompletionChoice {
                    message: ChatMessage::new(Role::Assistant, text),
                    finish_reason: map_finish_reason(candidate.finish_reason.as_deref()),
                }
            })
            .collect();

        let usage = gemini_response.usage_metadata.unwrap_or_default();
        let total = if usage.total_token_count > 0 {
            usage.total_token_count
        } else {
            usage
                .prompt_token_count
                .saturating_add(usage.candidates_token_count)
        };

        Ok(ChatCompletion {
            model: gemini_response
                .model_version
                .unwrap_or_else(|| strip_model_prefix(&options.model).to_string()),
            choices,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: total,
            },
        })
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingResponse, LLMError> {
        let model_path = Self::model_path(model);
        let request = GeminiEmbedBatch {
            requests: inputs
                .iter()
                .map(|text| GeminiEmbedRequest {
                    model: model_path.clone(),
                    content: GeminiContent {
                        role: None,
                        parts: vec![GeminiPart { text: text.as_str() }],
                    },
                })
                .collect(),
        };

        let url = self.model_url(model, "batchEmbedContents")?;

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, model).await);
        }

        let parsed: GeminiEmbedResponse = response.json().await.map_err(parse_error)?;

        Ok(EmbeddingResponse {
            model: strip_model_prefix(model).to_string(),
            data: parsed.embeddings.into_iter().map(|e| e.values).collect(),
            // The batch endpoint does not report token usage
            usage: TokenUsage::default(),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
        let response = self
            .client
            .get(endpoint(&self.endpoint, "models"))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "models").await);
        }

        let list: GeminiModelList = response.json().await.map_err(parse_error)?;

        Ok(list
            .models
            .into_iter()
            .map(|m| ModelDescriptor::new(strip_model_prefix(&m.name), Some("google".to_string())))
            .collect())
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        let response = self
            .client
            .get(endpoint(&self.endpoint, "models"))
            .header("x-goog-api-key", &self.api_key)
            .query(&[("pageSize", "1")])
            .send()
            .await
            .map_err(network_error)?;

        if response.status().is_success() {
            Ok(())
        } else if response.status() == 400 || response.status() == 401 || response.status() == 403 {
            // Gemini rejects bad keys with 400 INVALID_ARGUMENT
            Err(LLMError::Authentication("Invalid API key".into()))
        } else {
            Err(LLMError::Network(format!("HTTP {}", response.status())))
        }
    }

    fn is_usable(&self) -> bool {
        !self.api_key.is_empty()
    }
}
