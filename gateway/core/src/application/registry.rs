// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Registry - Lazy Provider Client Resolution
//
// Holds at most one default client per provider, created on first use from
// the configured credentials. Callers that bring their own credentials get a
// fresh request-scoped client and never touch the default slot.
//
// Slot lifecycle: Uninitialized -> Ready. A failed construction leaves the
// slot Uninitialized so the next caller starts over.

use crate::domain::credentials::Credentials;
use crate::domain::gateway_config::{GatewayConfig, ProviderSettings};
use crate::domain::llm::{LLMProvider, ProviderFactory};
use crate::domain::provider::ProviderKind;
use crate::infrastructure::llm::HttpProviderFactory;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Whether a handle is the provider's shared default or bound to one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleScope {
    Shared,
    Request,
}

/// Externally observable state of a provider's default slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Uninitialized,
    Ready,
}

/// A provider client bound to one set of credentials. Clones share the
/// underlying client.
#[derive(Clone)]
pub struct ServiceHandle {
    kind: ProviderKind,
    scope: HandleScope,
    client: Arc<dyn LLMProvider>,
    settings: Arc<ProviderSettings>,
}

impl ServiceHandle {
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn scope(&self) -> HandleScope {
        self.scope
    }

    pub fn client(&self) -> &dyn LLMProvider {
        self.client.as_ref()
    }

    /// Settings the client was built with, overrides included
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    /// True when both handles wrap the same client instance
    pub fn ptr_eq(&self, other: &ServiceHandle) -> bool {
        Arc::ptr_eq(&self.client, &other.client)
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{} service unavailable: {reason}", .provider.display_name())]
    ServiceUnavailable { provider: ProviderKind, reason: String },
}

struct ProviderSlot {
    settings: Arc<ProviderSettings>,
    default: OnceCell<ServiceHandle>,
}

pub struct ServiceRegistry {
    slots: BTreeMap<ProviderKind, ProviderSlot>,
    factory: Arc<dyn ProviderFactory>,
}

impl ServiceRegistry {
    /// Registry over the enabled providers of `config`. Nothing is
    /// constructed until the first resolution.
    pub fn new(config: &GatewayConfig, factory: Arc<dyn ProviderFactory>) -> Self {
        let slots: BTreeMap<_, _> = config
            .enabled_providers()
            .map(|(kind, settings)| {
                (
                    kind,
                    ProviderSlot {
                        settings: Arc::new(settings.clone()),
                        default: OnceCell::new(),
                    },
                )
            })
            .collect();

        info!(
            "Service registry ready for {} provider(s): {}",
            slots.len(),
            slots
                .keys()
                .map(|k| k.slug())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self { slots, factory }
    }

    /// Registry backed by the HTTP adapters
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config, Arc::new(HttpProviderFactory::new()))
    }

    fn slot(&self, kind: ProviderKind) -> Result<&ProviderSlot, RegistryError> {
        self.slots
            .get(&kind)
            .ok_or_else(|| RegistryError::UnknownProvider(kind.slug().to_string()))
    }

    /// Resolve a handle for `kind`.
    ///
    /// With a non-empty override a new request-scoped handle is built from
    /// the override merged over the configured defaults. Otherwise the
    /// default handle is returned, creating it first if needed; concurrent
    /// first callers wait for a single construction.
    pub async fn resolve(
        &self,
        kind: ProviderKind,
        credentials: Option<&Credentials>,
    ) -> Result<ServiceHandle, RegistryError> {
        let slot = self.slot(kind)?;

        if let Some(credentials) = credentials.filter(|c| !c.is_empty()) {
            let settings = Arc::new(slot.settings.with_override(credentials));
            let client = self
                .factory
                .create(kind, &settings)
                .await
                .map_err(|e| {
                    warn!("Failed to build request-scoped {} client: {}", kind.display_name(), e);
                    RegistryError::ServiceUnavailable {
                        provider: kind,
                        reason: e.to_string(),
                    }
                })?;
            debug!("Built request-scoped {} client", kind.display_name());
            return Ok(ServiceHandle {
                kind,
                scope: HandleScope::Request,
                client,
                settings,
            });
        }

        if let Some(handle) = slot.default.get() {
            return Ok(handle.clone());
        }

        let handle = slot
            .default
            .get_or_try_init(|| async {
                info!("Initializing default {} client", kind.display_name());
                let client = self.factory.create(kind, &slot.settings).await?;
                Ok::<_, anyhow::Error>(ServiceHandle {
                    kind,
                    scope: HandleScope::Shared,
                    client,
                    settings: slot.settings.clone(),
                })
            })
            .await
            .map_err(|e| {
                warn!("Failed to initialize default {} client: {}", kind.display_name(), e);
                RegistryError::ServiceUnavailable {
                    provider: kind,
                    reason: e.to_string(),
                }
            })?;

        Ok(handle.clone())
    }

    /// State of the default slot; never triggers construction
    pub fn slot_state(&self, kind: ProviderKind) -> Option<SlotState> {
        self.slots.get(&kind).map(|slot| {
            if slot.default.initialized() {
                SlotState::Ready
            } else {
                SlotState::Uninitialized
            }
        })
    }

    /// Peek at the default handle without creating it
    pub fn default_handle(&self, kind: ProviderKind) -> Option<ServiceHandle> {
        self.slots.get(&kind).and_then(|slot| slot.default.get().cloned())
    }

    pub fn has_default_credentials(&self, kind: ProviderKind) -> bool {
        self.slots
            .get(&kind)
            .map(|slot| slot.settings.has_credentials(kind))
            .unwrap_or(false)
    }

    /// Enabled providers in stable order
    pub fn providers(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.slots.keys().copied()
    }

    pub fn is_enabled(&self, kind: ProviderKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn settings(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.slots.get(&kind).map(|slot| slot.settings.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{
        ChatCompletion, ChatMessage, GenerationOptions, LLMError, ModelDescriptor,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullProvider;

    #[async_trait]
    impl LLMProvider for NullProvider {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: &GenerationOptions,
        ) -> Result<ChatCompletion, LLMError> {
            Err(LLMError::Unsupported("chat".into()))
        }

        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProviderFactory for CountingFactory {
        async fn create(
            &self,
            _kind: ProviderKind,
            _settings: &ProviderSettings,
        ) -> anyhow::Result<Arc<dyn LLMProvider>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullProvider))
        }
    }

    #[tokio::test]
    async fn test_default_handle_is_reused() {
        let factory = Arc::new(CountingFactory::default());
        let registry = ServiceRegistry::new(&GatewayConfig::default(), factory.clone());

        assert_eq!(registry.slot_state(ProviderKind::Ollama), Some(SlotState::Uninitialized));
        let first = registry.resolve(ProviderKind::Ollama, None).await.unwrap();
        let second = registry.resolve(ProviderKind::Ollama, None).await.unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(first.scope(), HandleScope::Shared);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.slot_state(ProviderKind::Ollama), Some(SlotState::Ready));
    }

    #[tokio::test]
    async fn test_empty_override_uses_default_slot() {
        let factory = Arc::new(CountingFactory::default());
        let registry = ServiceRegistry::new(&GatewayConfig::default(), factory);

        let empty = Credentials::default();
        let handle = registry.resolve(ProviderKind::Ollama, Some(&empty)).await.unwrap();
        assert_eq!(handle.scope(), HandleScope::Shared);
    }

    #[tokio::test]
    async fn test_disabled_provider_is_unknown() {
        let mut config = GatewayConfig::default();
        config.providers.get_mut(&ProviderKind::Gemini).unwrap().enabled = false;
        let registry = ServiceRegistry::new(&config, Arc::new(CountingFactory::default()));

        let err = registry.resolve(ProviderKind::Gemini, None).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownProvider(ref slug) if slug == "gemini"));
        assert_eq!(registry.slot_state(ProviderKind::Gemini), None);
        assert!(!registry.providers().any(|k| k == ProviderKind::Gemini));
    }

    #[tokio::test]
    async fn test_http_factory_reports_missing_key() {
        let registry = ServiceRegistry::from_config(&GatewayConfig::default());
        let err = registry.resolve(ProviderKind::Anthropic, None).await.unwrap_err();
        match err {
            RegistryError::ServiceUnavailable { provider, reason } => {
                assert_eq!(provider, ProviderKind::Anthropic);
                assert!(reason.contains("ANTHROPIC_API_KEY"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            registry.slot_state(ProviderKind::Anthropic),
            Some(SlotState::Uninitialized)
        );
    }
}
