// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain interface and one external API.
// HTTP failures are classified the same way for every provider.

pub mod anthropic;
pub mod dolibarr;
pub mod factory;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use factory::HttpProviderFactory;

use crate::domain::llm::{FinishReason, LLMError};

/// Join a base URL and a path without doubling slashes
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a non-success response into a domain error
pub(crate) async fn error_from_response(response: reqwest::Response, subject: &str) -> LLMError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    if status == 401 || status == 403 {
        LLMError::Authentication(error_text)
    } else if status == 429 {
        LLMError::RateLimit
    } else if status == 404 {
        LLMError::ModelNotFound(subject.to_string())
    } else {
        LLMError::Provider(format!("HTTP {}: {}", status, error_text))
    }
}

pub(crate) fn network_error(e: reqwest::Error) -> LLMError {
    LLMError::Network(e.to_string())
}

pub(crate) fn parse_error(e: reqwest::Error) -> LLMError {
    LLMError::Provider(format!("Failed to parse response: {}", e))
}

/// Map the stop reasons used across vendors onto the domain enum
pub(crate) fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason.map(|r| r.to_ascii_lowercase()).as_deref() {
        None => FinishReason::Stop,
        Some("stop" | "end_turn" | "stop_sequence" | "eos") => FinishReason::Stop,
        Some("length" | "max_tokens" | "model_length") => FinishReason::Length,
        Some("content_filter" | "safety" | "recitation" | "blocklist" | "prohibited_content") => {
            FinishReason::ContentFilter
        }
        Some("tool_calls" | "function_call" | "tool_use") => FinishReason::ToolCalls,
        Some(_) => FinishReason::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(endpoint("http://localhost:11434", "api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("stop")), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some("end_turn")), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(map_finish_reason(Some("SAFETY")), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason(Some("tool_use")), FinishReason::ToolCalls);
        assert_eq!(map_finish_reason(Some("weird")), FinishReason::Unknown);
        assert_eq!(map_finish_reason(None), FinishReason::Stop);
    }
}
