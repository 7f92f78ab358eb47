// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provider-neutral chat, embedding and model-listing interface.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer between the gateway and vendor APIs

// Implementations live in infrastructure/llm/. Adapters never decide what an
// empty response means; they hand back every choice they received and the
// dispatcher picks the first one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::gateway_config::ProviderSettings;
use super::provider::ProviderKind;

/// Domain interface for upstream providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run a chat completion over an ordered conversation
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError>;

    /// Compute one embedding vector per input
    async fn embed(&self, _inputs: &[String], _model: &str) -> Result<EmbeddingResponse, LLMError> {
        Err(LLMError::Unsupported("embeddings".into()))
    }

    /// List the models the provider currently offers
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError>;

    /// Check if provider is healthy and accessible
    async fn health_check(&self) -> Result<(), LLMError>;

    /// Cheap, network-free check that the client holds what it needs to
    /// issue calls. Health reporting relies on this never blocking.
    fn is_usable(&self) -> bool {
        true
    }
}

/// Builds provider clients from effective settings. The registry owns one
/// factory and calls it for default slots and request-scoped handles alike.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    async fn create(
        &self,
        kind: ProviderKind,
        settings: &ProviderSettings,
    ) -> anyhow::Result<Arc<dyn LLMProvider>>;
}

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Options for one outbound generation call, after gateway defaults have
/// been applied. `None` fields are left out of the provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier understood by the provider
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

impl GenerationOptions {
    pub fn new(model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            temperature,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
        }
    }
}

/// Raw completion as returned by an adapter
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Model that served the request (as reported by the provider)
    pub model: String,

    /// Candidate answers, possibly empty
    pub choices: Vec<CompletionChoice>,

    /// Token usage stats
    pub usage: TokenUsage,
}

#[derive(Debug, Clone)]
pub struct CompletionChoice {
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Reason why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_tokens limit
    Length,

    /// Blocked by content filter
    ContentFilter,

    /// Model asked for a tool call
    ToolCalls,

    /// Provider reported a reason we do not map
    Unknown,
}

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub model: String,

    /// One vector per input, in input order
    pub data: Vec<Vec<f32>>,

    pub usage: TokenUsage,
}

/// Entry of a provider's model catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,

    pub object: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, owned_by: Option<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created: None,
            owned_by,
        }
    }
}

/// Errors that can occur during provider calls
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        assert_eq!(TokenUsage::new(3, 4).total_tokens, 7);
        assert_eq!(TokenUsage::new(u32::MAX, 10).total_tokens, u32::MAX);
    }
}
