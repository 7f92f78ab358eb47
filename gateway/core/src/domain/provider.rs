// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Provider catalogue
//!
//! Closed set of upstream systems the gateway can front, with the static
//! facts each one needs: URL slug, display name, default endpoint and model,
//! environment prefix, credential requirements and supported operations.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Identify providers and describe their capabilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream provider served under `/api/v1/{provider}/...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
    Mistral,
    Nvidia,
    Ollama,
    Perplexity,
    Dolibarr,
}

/// Operations a provider may expose through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Chat,
    Embeddings,
    Models,
    Status,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Chat => "chat",
            Operation::Embeddings => "embeddings",
            Operation::Models => "models",
            Operation::Status => "status",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Mistral,
        ProviderKind::Nvidia,
        ProviderKind::Ollama,
        ProviderKind::Perplexity,
        ProviderKind::Dolibarr,
    ];

    /// Path segment and config key
    pub fn slug(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mistral => "mistral",
            ProviderKind::Nvidia => "nvidia",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::Dolibarr => "dolibarr",
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Mistral => "Mistral",
            ProviderKind::Nvidia => "NVIDIA NIM",
            ProviderKind::Ollama => "Ollama",
            ProviderKind::Perplexity => "Perplexity",
            ProviderKind::Dolibarr => "Dolibarr",
        }
    }

    /// Prefix of the `<PREFIX>_API_KEY`-style environment variables
    pub fn env_prefix(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI",
            ProviderKind::Anthropic => "ANTHROPIC",
            ProviderKind::Gemini => "GEMINI",
            ProviderKind::Mistral => "MISTRAL",
            ProviderKind::Nvidia => "NVIDIA",
            ProviderKind::Ollama => "OLLAMA",
            ProviderKind::Perplexity => "PERPLEXITY",
            ProviderKind::Dolibarr => "DOLIBARR",
        }
    }

    /// Public endpoint used when no base URL is configured.
    /// Dolibarr is self-hosted and has none.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Mistral => "https://api.mistral.ai/v1",
            ProviderKind::Nvidia => "https://integrate.api.nvidia.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
            ProviderKind::Perplexity => "https://api.perplexity.ai",
            ProviderKind::Dolibarr => "",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Mistral => "mistral-small-latest",
            ProviderKind::Nvidia => "meta/llama-3.1-8b-instruct",
            ProviderKind::Ollama => "llama3.2",
            ProviderKind::Perplexity => "sonar",
            ProviderKind::Dolibarr => "",
        }
    }

    pub fn default_embedding_model(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAI => Some("text-embedding-3-small"),
            ProviderKind::Gemini => Some("text-embedding-004"),
            ProviderKind::Mistral => Some("mistral-embed"),
            ProviderKind::Nvidia => Some("nvidia/nv-embedqa-e5-v5"),
            ProviderKind::Ollama => Some("nomic-embed-text"),
            ProviderKind::Anthropic | ProviderKind::Perplexity | ProviderKind::Dolibarr => None,
        }
    }

    /// Local Ollama servers run without authentication
    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }

    /// Self-hosted systems have no public endpoint to fall back on
    pub fn requires_base_url(self) -> bool {
        matches!(self, ProviderKind::Dolibarr)
    }

    /// Upper bound of the accepted sampling temperature
    pub fn max_temperature(self) -> f32 {
        match self {
            ProviderKind::Anthropic | ProviderKind::Nvidia => 1.0,
            ProviderKind::Mistral => 1.5,
            _ => 2.0,
        }
    }

    pub fn supports(self, operation: Operation) -> bool {
        match operation {
            Operation::Status => true,
            Operation::Chat | Operation::Models => !matches!(self, ProviderKind::Dolibarr),
            Operation::Embeddings => self.default_embedding_model().is_some(),
        }
    }

    pub fn operations(self) -> Vec<Operation> {
        [
            Operation::Chat,
            Operation::Embeddings,
            Operation::Models,
            Operation::Status,
        ]
        .into_iter()
        .filter(|op| self.supports(*op))
        .collect()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == needle)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_parsing_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!(" nvidia ".parse::<ProviderKind>().unwrap(), ProviderKind::Nvidia);
        assert!("cohere".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_slugs_match_serde_names() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.slug()));
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(ProviderKind::OpenAI.supports(Operation::Embeddings));
        assert!(!ProviderKind::Anthropic.supports(Operation::Embeddings));
        assert!(!ProviderKind::Perplexity.supports(Operation::Embeddings));
        assert!(!ProviderKind::Dolibarr.supports(Operation::Chat));
        assert_eq!(ProviderKind::Dolibarr.operations(), vec![Operation::Status]);
        assert!(!ProviderKind::Ollama.requires_api_key());
        assert!(ProviderKind::Dolibarr.requires_base_url());
    }
}
