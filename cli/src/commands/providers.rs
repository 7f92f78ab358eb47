// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provider catalogue command

use anyhow::{Context, Result};
use colored::Colorize;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;

use llm_gateway_core::{
    application::{dispatcher::RequestDispatcher, registry::ServiceRegistry},
    domain::{
        gateway_config::GatewayConfig,
        provider::{Operation, ProviderKind},
        response::ServiceResult,
    },
};

pub async fn handle_command(config_path: Option<PathBuf>, probe: bool) -> Result<()> {
    let config =
        GatewayConfig::load_or_default(config_path).context("Failed to load configuration")?;

    println!(
        "{:<12} {:<14} {:<9} {:<12} {}",
        "PROVIDER".bold(),
        "NAME".bold(),
        "ENABLED".bold(),
        "CREDENTIALS".bold(),
        "OPERATIONS".bold()
    );

    for kind in ProviderKind::ALL {
        let Some(settings) = config.provider(kind) else {
            continue;
        };
        let enabled = if settings.enabled {
            "yes".green()
        } else {
            "no".dimmed()
        };
        let credentials = if settings.has_credentials(kind) {
            "configured".green()
        } else {
            "missing".yellow()
        };
        println!(
            "{:<12} {:<14} {:<9} {:<12} {}",
            kind.slug(),
            kind.display_name(),
            enabled,
            credentials,
            operations_label(kind)
        );
    }

    if probe {
        println!();
        probe_all(&config).await;
    }

    Ok(())
}

fn operations_label(kind: ProviderKind) -> String {
    kind.operations()
        .into_iter()
        .map(Operation::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run a live status check against every enabled provider concurrently.
async fn probe_all(config: &GatewayConfig) {
    let registry = Arc::new(ServiceRegistry::from_config(config));
    let dispatcher = RequestDispatcher::new(registry.clone());

    let kinds: Vec<ProviderKind> = registry.providers().collect();
    let probes = kinds.iter().map(|kind| dispatcher.status(*kind, None));
    let results = join_all(probes).await;

    println!("{}", "Probing providers...".bold());
    for (kind, result) in kinds.iter().zip(results) {
        match result {
            Ok(ServiceResult::Success(payload)) => println!(
                "  {} {} ({} ms)",
                "✓".green(),
                kind.display_name(),
                payload.latency_ms
            ),
            Ok(ServiceResult::Failure(error)) => {
                println!("  {} {}: {}", "✗".red(), kind.display_name(), error)
            }
            Err(e) => println!("  {} {}: {}", "✗".red(), kind.display_name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_label() {
        assert_eq!(operations_label(ProviderKind::Dolibarr), "status");
        assert!(operations_label(ProviderKind::OpenAI).starts_with("chat"));
    }
}
