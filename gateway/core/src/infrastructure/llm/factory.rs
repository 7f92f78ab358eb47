// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP Provider Factory
//
// Turns effective provider settings into a concrete adapter. Used by the
// registry for both default slots and request-scoped handles.

use crate::domain::gateway_config::ProviderSettings;
use crate::domain::llm::{LLMProvider, ProviderFactory};
use crate::domain::provider::ProviderKind;
use async_trait::async_trait;
use std::sync::Arc;

use super::anthropic::AnthropicAdapter;
use super::dolibarr::DolibarrAdapter;
use super::gemini::GeminiAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProviderFactory;

impl HttpProviderFactory {
    pub fn new() -> Self {
        Self
    }

    /// Resolve API key from settings (supports "env:VAR_NAME" syntax)
    fn resolve_api_key(kind: ProviderKind, key: &Option<String>) -> anyhow::Result<Option<String>> {
        let resolved = match key.as_deref().map(str::trim) {
            Some(k) if k.starts_with("env:") => {
                let var_name = k.trim_start_matches("env:");
                let value = std::env::var(var_name)
                    .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name))?;
                Some(value)
            }
            Some(k) => Some(k.to_string()),
            None => None,
        };

        let resolved = resolved.filter(|k| !k.trim().is_empty());
        if resolved.is_none() && kind.requires_api_key() {
            anyhow::bail!(
                "{} API key is not configured. Provide it via the X-API-Key header or set {}_API_KEY",
                kind.display_name(),
                kind.env_prefix()
            );
        }
        Ok(resolved)
    }

    fn resolve_base_url(kind: ProviderKind, base_url: &str) -> anyhow::Result<String> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            if kind.requires_base_url() {
                anyhow::bail!(
                    "{} base URL is not configured. Provide it via the X-Base-URL header or set {}_BASE_URL",
                    kind.display_name(),
                    kind.env_prefix()
                );
            }
            return Ok(kind.default_base_url().to_string());
        }

        let parsed = url::Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid {} base URL '{}': {}", kind.display_name(), base_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("{} base URL must use http or https", kind.display_name());
        }
        Ok(base_url.to_string())
    }
}

#[async_trait]
impl ProviderFactory for HttpProviderFactory {
    async fn create(
        &self,
        kind: ProviderKind,
        settings: &ProviderSettings,
    ) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let api_key = Self::resolve_api_key(kind, &settings.api_key)?;
        let base_url = Self::resolve_base_url(kind, &settings.base_url)?;

        let provider: Arc<dyn LLMProvider> = match kind {
            ProviderKind::OpenAI
            | ProviderKind::Mistral
            | ProviderKind::Nvidia
            | ProviderKind::Perplexity => {
                Arc::new(OpenAIAdapter::new(kind, base_url, api_key.unwrap_or_default()))
            }
            ProviderKind::Anthropic => {
                Arc::new(AnthropicAdapter::new(base_url, api_key.unwrap_or_default()))
            }
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(base_url, api_key.unwrap_or_default())),
            ProviderKind::Ollama => Arc::new(OllamaAdapter::new(base_url, api_key)),
            ProviderKind::Dolibarr => {
                Arc::new(DolibarrAdapter::new(base_url, api_key.unwrap_or_default()))
            }
        };

        Ok(provider)
    }
}
