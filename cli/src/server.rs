// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway HTTP server bootstrap

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use llm_gateway_core::{
    application::registry::ServiceRegistry,
    domain::gateway_config::{Environment, GatewayConfig},
    presentation::api::app,
};

use crate::{init_logging, LogFormat};

pub async fn serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    log_level: &str,
) -> Result<()> {
    let discovered = config_path.clone().or_else(GatewayConfig::discover_config);

    // Load configuration
    let mut config =
        GatewayConfig::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let format = match config.server.environment {
        Environment::Development => LogFormat::Compact,
        Environment::Staging | Environment::Production => LogFormat::Json,
    };
    init_logging(log_level, format)?;

    match &discovered {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using defaults and environment"),
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        "LLM gateway starting (version {}, environment {})",
        env!("CARGO_PKG_VERSION"),
        config.server.environment.as_str()
    );

    if let Some(metrics_port) = config.server.metrics_port {
        install_metrics_exporter(&config.server.host, metrics_port)?;
    }

    let registry = Arc::new(ServiceRegistry::from_config(&config));
    for kind in registry.providers() {
        if !registry.has_default_credentials(kind) {
            warn!(
                "{} has no default credentials; requests must supply X-API-Key or set {}_API_KEY",
                kind.display_name(),
                kind.env_prefix()
            );
        }
    }

    let router = app(&config, registry);

    // Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Gateway listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Gateway shutting down");

    Ok(())
}

fn install_metrics_exporter(host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid metrics listen address {}:{}", host, port))?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Prometheus metrics available on http://{}/metrics", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
