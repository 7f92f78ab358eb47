// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Inbound request bodies
//!
//! Shapes accepted by the chat and embedding endpoints, with the range
//! checks that apply before anything is sent upstream.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Request contract and validation

use serde::{Deserialize, Serialize};

use super::llm::{ChatMessage, Role};
use super::provider::ProviderKind;

/// Body of `POST /api/v1/{provider}/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation in order; order is significant
    pub messages: Vec<ChatMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Accepted for compatibility; answers are always returned whole
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            stream: false,
        }
    }

    /// Check the request against the provider's accepted ranges.
    /// All violations are reported together.
    pub fn validate(&self, provider: ProviderKind) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.messages.is_empty() {
            problems.push("messages must contain at least one message".to_string());
        }
        for (idx, msg) in self.messages.iter().enumerate() {
            if msg.role != Role::Assistant && msg.content.trim().is_empty() {
                problems.push(format!("messages[{}].content must not be empty", idx));
            }
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                problems.push("model must not be blank".to_string());
            }
        }

        if let Some(t) = self.temperature {
            let max = provider.max_temperature();
            if !(0.0..=max).contains(&t) {
                problems.push(format!(
                    "temperature must be between 0.0 and {:.1} for {}",
                    max,
                    provider.display_name()
                ));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                problems.push("top_p must be between 0.0 and 1.0".to_string());
            }
        }
        if self.max_tokens == Some(0) {
            problems.push("max_tokens must be a positive integer".to_string());
        }
        if self.top_k == Some(0) {
            problems.push("top_k must be a positive integer".to_string());
        }
        for (name, value) in [
            ("frequency_penalty", self.frequency_penalty),
            ("presence_penalty", self.presence_penalty),
        ] {
            if let Some(v) = value {
                if !(-2.0..=2.0).contains(&v) {
                    problems.push(format!("{} must be between -2.0 and 2.0", name));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Body of `POST /api/v1/{provider}/embeddings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub input: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl EmbeddingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.input.is_empty() {
            return Err("input must contain at least one string".to_string());
        }
        if let Some(idx) = self.input.iter().position(|s| s.trim().is_empty()) {
            return Err(format!("input[{}] must not be empty", idx));
        }
        if matches!(&self.model, Some(m) if m.trim().is_empty()) {
            return Err("model must not be blank".to_string());
        }
        Ok(())
    }
}
