// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Uniform response contract
//!
//! Every provider operation ends in a [`ServiceResult`]: either a success
//! payload or an error description, never both. On the wire this is a flat
//! JSON object carrying a `success` flag so callers can branch on the body
//! rather than on the HTTP status.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Tagged outcomes returned by the dispatcher

use serde::{Serialize, Serializer};

use super::llm::{ChatMessage, FinishReason, ModelDescriptor, TokenUsage};

/// Error text used when a well-formed response carried no entries
pub const NO_RESULT_GENERATED: &str = "no result generated by the model";

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResult<T> {
    Success(T),
    Failure(String),
}

pub type ChatResult = ServiceResult<ChatPayload>;
pub type EmbeddingResult = ServiceResult<EmbeddingPayload>;
pub type ModelListResult = ServiceResult<ModelListPayload>;
pub type StatusResult = ServiceResult<StatusPayload>;

impl<T> ServiceResult<T> {
    pub fn failure(error: impl Into<String>) -> Self {
        ServiceResult::Failure(error.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServiceResult::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ServiceResult::Success(payload) => Some(payload),
            ServiceResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ServiceResult::Success(_) => None,
            ServiceResult::Failure(error) => Some(error),
        }
    }
}

impl<T: Serialize> Serialize for ServiceResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, P: Serialize> {
            success: bool,
            #[serde(flatten)]
            payload: Option<&'a P>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        Tagged {
            success: self.is_success(),
            payload: self.payload(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    pub provider: String,
    pub message: ChatMessage,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingPayload {
    pub provider: String,
    pub model: String,
    pub embeddings: Vec<Vec<f32>>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelListPayload {
    pub provider: String,
    pub models: Vec<ModelDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    pub provider: String,
    pub reachable: bool,
    pub latency_ms: u64,
}
