// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Health Reporter
//
// Answers health probes from registry state alone. A probe never builds a
// client and never reaches the network, so it is safe to poll.

use crate::domain::provider::ProviderKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::registry::{RegistryError, ServiceRegistry, SlotState};

const SERVICE_NAME: &str = "llm-gateway";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub status: HealthState,
    pub provider: String,
    pub service: String,
    pub version: String,
    /// Default credentials are configured
    pub configured: bool,
    /// The default client has been created
    pub initialized: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayHealth {
    pub status: HealthState,
    pub service: String,
    pub version: String,
    pub providers: BTreeMap<String, ProviderHealth>,
}

pub struct HealthReporter {
    registry: Arc<ServiceRegistry>,
}

impl HealthReporter {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Healthy when the default client exists and is usable, or when it
    /// does not exist yet but could be built from default credentials.
    pub fn check(&self, kind: ProviderKind) -> Result<ProviderHealth, RegistryError> {
        let state = self
            .registry
            .slot_state(kind)
            .ok_or_else(|| RegistryError::UnknownProvider(kind.slug().to_string()))?;
        let configured = self.registry.has_default_credentials(kind);

        let healthy = match state {
            SlotState::Ready => self
                .registry
                .default_handle(kind)
                .map(|handle| handle.client().is_usable())
                .unwrap_or(false),
            SlotState::Uninitialized => configured,
        };

        Ok(ProviderHealth {
            status: if healthy {
                HealthState::Healthy
            } else {
                HealthState::Unhealthy
            },
            provider: kind.slug().to_string(),
            service: format!("{} service", kind.display_name()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            configured,
            initialized: state == SlotState::Ready,
        })
    }

    /// Gateway is healthy while at least one enabled provider is
    pub fn check_all(&self) -> GatewayHealth {
        let providers: BTreeMap<String, ProviderHealth> = self
            .registry
            .providers()
            .filter_map(|kind| self.check(kind).ok())
            .map(|health| (health.provider.clone(), health))
            .collect();

        let status = if providers
            .values()
            .any(|health| health.status == HealthState::Healthy)
        {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };

        GatewayHealth {
            status,
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            providers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway_config::GatewayConfig;

    #[test]
    fn test_unconfigured_provider_is_unhealthy() {
        let registry = Arc::new(ServiceRegistry::from_config(&GatewayConfig::default()));
        let reporter = HealthReporter::new(registry.clone());

        let openai = reporter.check(ProviderKind::OpenAI).unwrap();
        assert_eq!(openai.status, HealthState::Unhealthy);
        assert!(!openai.configured);
        assert!(!openai.initialized);

        // Ollama runs without a key, so it counts as configured
        let ollama = reporter.check(ProviderKind::Ollama).unwrap();
        assert_eq!(ollama.status, HealthState::Healthy);

        let overall = reporter.check_all();
        assert_eq!(overall.status, HealthState::Healthy);
        assert_eq!(overall.providers.len(), ProviderKind::ALL.len());
        assert_eq!(registry.slot_state(ProviderKind::Ollama), Some(SlotState::Uninitialized));
    }

    #[test]
    fn test_all_unhealthy_gateway() {
        let mut config = GatewayConfig::default();
        config.providers.get_mut(&ProviderKind::Ollama).unwrap().enabled = false;
        let registry = Arc::new(ServiceRegistry::from_config(&config));
        let reporter = HealthReporter::new(registry);

        assert_eq!(reporter.check_all().status, HealthState::Unhealthy);
        assert!(matches!(
            reporter.check(ProviderKind::Ollama),
            Err(RegistryError::UnknownProvider(_))
        ));
    }
}
