// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Request Dispatcher - Provider Operation Use Cases
//
// Validates an inbound request, resolves a service handle, calls the
// provider under its timeout and folds the outcome into a ServiceResult.
// Provider failures become structured results; only routing, validation and
// configuration problems surface as DispatchError.

use crate::domain::credentials::Credentials;
use crate::domain::llm::{GenerationOptions, LLMError};
use crate::domain::provider::{Operation, ProviderKind};
use crate::domain::request::{ChatRequest, EmbeddingRequest};
use crate::domain::response::{
    ChatPayload, ChatResult, EmbeddingPayload, EmbeddingResult, ModelListPayload,
    ModelListResult, ServiceResult, StatusPayload, StatusResult, NO_RESULT_GENERATED,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use super::registry::{RegistryError, ServiceHandle, ServiceRegistry};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{} does not support {operation}", .provider.display_name())]
    Unsupported {
        provider: ProviderKind,
        operation: Operation,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{} service unavailable: {reason}", .provider.display_name())]
    ServiceUnavailable { provider: ProviderKind, reason: String },
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider(slug) => DispatchError::UnknownProvider(slug),
            RegistryError::ServiceUnavailable { provider, reason } => {
                DispatchError::ServiceUnavailable { provider, reason }
            }
        }
    }
}

pub struct RequestDispatcher {
    registry: Arc<ServiceRegistry>,
}

impl RequestDispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub async fn chat(
        &self,
        kind: ProviderKind,
        request: ChatRequest,
        credentials: Option<&Credentials>,
    ) -> Result<ChatResult, DispatchError> {
        self.admit(kind, Operation::Chat)?;
        request
            .validate(kind)
            .map_err(|e| self.reject(kind, Operation::Chat, e))?;
        let handle = self.handle(kind, Operation::Chat, credentials).await?;

        if request.stream {
            debug!("Streaming requested for {}; answering with a single response", kind);
        }

        let settings = handle.settings();
        let options = GenerationOptions {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| settings.default_model.clone()),
            max_tokens: request.max_tokens.unwrap_or(settings.max_tokens),
            temperature: request.temperature.unwrap_or(settings.temperature),
            top_p: request.top_p,
            top_k: request.top_k,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
        };

        let started = Instant::now();
        let outcome =
            call_with_timeout(&handle, handle.client().chat(&request.messages, &options)).await;

        let result = match outcome {
            Ok(completion) => match completion.choices.into_iter().next() {
                Some(choice) => ChatResult::Success(ChatPayload {
                    provider: kind.slug().to_string(),
                    message: choice.message,
                    model: completion.model,
                    usage: completion.usage,
                    finish_reason: choice.finish_reason,
                }),
                None => {
                    warn!("{} returned no choices for model {}", kind.display_name(), options.model);
                    ChatResult::failure(NO_RESULT_GENERATED)
                }
            },
            Err(e) => provider_failure(kind, Operation::Chat, e),
        };

        record(kind, Operation::Chat, result.is_success(), started);
        Ok(result)
    }

    pub async fn embed(
        &self,
        kind: ProviderKind,
        request: EmbeddingRequest,
        credentials: Option<&Credentials>,
    ) -> Result<EmbeddingResult, DispatchError> {
        self.admit(kind, Operation::Embeddings)?;
        request
            .validate()
            .map_err(|e| self.reject(kind, Operation::Embeddings, e))?;
        let handle = self.handle(kind, Operation::Embeddings, credentials).await?;

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| handle.settings().embedding_model.clone());

        let started = Instant::now();
        let outcome =
            call_with_timeout(&handle, handle.client().embed(&request.input, &model)).await;

        let result = match outcome {
            Ok(response) if response.data.is_empty() => {
                warn!("{} returned no embeddings for model {}", kind.display_name(), model);
                EmbeddingResult::failure(NO_RESULT_GENERATED)
            }
            Ok(response) => EmbeddingResult::Success(EmbeddingPayload {
                provider: kind.slug().to_string(),
                model: response.model,
                embeddings: response.data,
                usage: response.usage,
            }),
            Err(e) => provider_failure(kind, Operation::Embeddings, e),
        };

        record(kind, Operation::Embeddings, result.is_success(), started);
        Ok(result)
    }

    pub async fn list_models(
        &self,
        kind: ProviderKind,
        credentials: Option<&Credentials>,
    ) -> Result<ModelListResult, DispatchError> {
        self.admit(kind, Operation::Models)?;
        let handle = self.handle(kind, Operation::Models, credentials).await?;

        let started = Instant::now();
        let outcome = call_with_timeout(&handle, handle.client().list_models()).await;

        let result = match outcome {
            Ok(models) if models.is_empty() => {
                warn!("{} returned an empty model list", kind.display_name());
                ModelListResult::failure(NO_RESULT_GENERATED)
            }
            Ok(models) => ModelListResult::Success(ModelListPayload {
                provider: kind.slug().to_string(),
                models,
            }),
            Err(e) => provider_failure(kind, Operation::Models, e),
        };

        record(kind, Operation::Models, result.is_success(), started);
        Ok(result)
    }

    /// Live reachability probe. Unlike health reporting this resolves a
    /// handle and talks to the provider.
    pub async fn status(
        &self,
        kind: ProviderKind,
        credentials: Option<&Credentials>,
    ) -> Result<StatusResult, DispatchError> {
        self.admit(kind, Operation::Status)?;
        let handle = self.handle(kind, Operation::Status, credentials).await?;

        let started = Instant::now();
        let outcome = call_with_timeout(&handle, handle.client().health_check()).await;

        let result = match outcome {
            Ok(()) => StatusResult::Success(StatusPayload {
                provider: kind.slug().to_string(),
                reachable: true,
                latency_ms: started.elapsed().as_millis() as u64,
            }),
            Err(e) => provider_failure(kind, Operation::Status, e),
        };

        record(kind, Operation::Status, result.is_success(), started);
        Ok(result)
    }

    fn admit(&self, kind: ProviderKind, operation: Operation) -> Result<(), DispatchError> {
        if !self.registry.is_enabled(kind) {
            count(kind, operation, "unknown_provider");
            return Err(DispatchError::UnknownProvider(kind.slug().to_string()));
        }
        if !kind.supports(operation) {
            count(kind, operation, "unsupported");
            return Err(DispatchError::Unsupported {
                provider: kind,
                operation,
            });
        }
        Ok(())
    }

    fn reject(&self, kind: ProviderKind, operation: Operation, reason: String) -> DispatchError {
        warn!("Rejected {} {} request: {}", kind, operation, reason);
        count(kind, operation, "invalid");
        DispatchError::InvalidRequest(reason)
    }

    async fn handle(
        &self,
        kind: ProviderKind,
        operation: Operation,
        credentials: Option<&Credentials>,
    ) -> Result<ServiceHandle, DispatchError> {
        self.registry.resolve(kind, credentials).await.map_err(|e| {
            error!("Cannot serve {} {}: {}", kind, operation, e);
            count(kind, operation, "unavailable");
            DispatchError::from(e)
        })
    }
}

async fn call_with_timeout<T, F>(handle: &ServiceHandle, call: F) -> Result<T, LLMError>
where
    F: Future<Output = Result<T, LLMError>>,
{
    match tokio::time::timeout(handle.timeout(), call).await {
        Ok(result) => result,
        Err(_) => Err(LLMError::Timeout(handle.settings().timeout_secs)),
    }
}

fn provider_failure<T>(kind: ProviderKind, operation: Operation, err: LLMError) -> ServiceResult<T> {
    warn!("{} {} call failed: {}", kind.display_name(), operation, err);
    ServiceResult::failure(format!("{} API error: {}", kind.display_name(), err))
}

fn record(kind: ProviderKind, operation: Operation, success: bool, started: Instant) {
    count(kind, operation, if success { "success" } else { "failure" });
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "provider" => kind.slug(),
        "operation" => operation.as_str()
    )
    .record(started.elapsed().as_secs_f64());
}

fn count(kind: ProviderKind, operation: Operation, outcome: &'static str) {
    metrics::counter!(
        "gateway_requests_total",
        "provider" => kind.slug(),
        "operation" => operation.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
