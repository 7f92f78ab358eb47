// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures: an in-memory provider and a factory that counts and
//! optionally fails or delays constructions.

#![allow(dead_code)]

use async_trait::async_trait;
use llm_gateway_core::domain::gateway_config::{GatewayConfig, ProviderSettings};
use llm_gateway_core::domain::llm::{
    ChatCompletion, ChatMessage, CompletionChoice, EmbeddingResponse, FinishReason,
    GenerationOptions, LLMError, LLMProvider, ModelDescriptor, ProviderFactory, Role, TokenUsage,
};
use llm_gateway_core::domain::provider::ProviderKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_KEY: &str = "default-key";

pub struct MockProvider {
    pub api_key: Option<String>,
    pub choices: usize,
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError> {
        let key = self.api_key.clone().unwrap_or_default();
        let choices = (0..self.choices)
            .map(|_| CompletionChoice {
                message: ChatMessage::new(Role::Assistant, format!("reply using {}", key)),
                finish_reason: FinishReason::Stop,
            })
            .collect();
        Ok(ChatCompletion {
            model: options.model.clone(),
            choices,
            usage: TokenUsage::new(5, 3),
        })
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingResponse, LLMError> {
        Ok(EmbeddingResponse {
            model: model.to_string(),
            data: inputs.iter().map(|s| vec![s.len() as f32]).collect(),
            usage: TokenUsage::new(inputs.len() as u32, 0),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
        Ok(vec![ModelDescriptor::new("mock-model", Some("mock".to_string()))])
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        Ok(())
    }

    fn is_usable(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Default)]
pub struct MockFactory {
    pub constructions: AtomicUsize,
    pub failures_left: AtomicUsize,
    /// Delay applied while building a client from the default key
    pub default_delay: Option<Duration>,
    pub choices: usize,
}

impl MockFactory {
    pub fn new(choices: usize) -> Self {
        Self {
            choices,
            ..Self::default()
        }
    }

    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            choices: 1,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            default_delay: Some(delay),
            choices: 1,
            ..Self::default()
        }
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderFactory for MockFactory {
    async fn create(
        &self,
        kind: ProviderKind,
        settings: &ProviderSettings,
    ) -> anyhow::Result<Arc<dyn LLMProvider>> {
        self.constructions.fetch_add(1, Ordering::SeqCst);

        if settings.api_key.as_deref() == Some(DEFAULT_KEY) {
            if let Some(delay) = self.default_delay {
                tokio::time::sleep(delay).await;
            }
        }

        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail || settings.api_key.is_none() {
            anyhow::bail!(
                "{} API key is not configured. Provide it via the X-API-Key header or set {}_API_KEY",
                kind.display_name(),
                kind.env_prefix()
            );
        }

        Ok(Arc::new(MockProvider {
            api_key: settings.api_key.clone(),
            choices: self.choices,
        }))
    }
}

/// Default configuration with a key for OpenAI only
pub fn config_with_openai_key() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    if let Some(settings) = config.providers.get_mut(&ProviderKind::OpenAI) {
        settings.api_key = Some(DEFAULT_KEY.to_string());
    }
    config
}
