// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use llm_gateway_core::domain::gateway_config::{GatewayConfig, CONFIG_PATH_ENV};

const GENERATED_HEADER: &str = "\
# LLM gateway configuration
#
# Every value can be overridden from the environment, e.g. GATEWAY_PORT,
# ENVIRONMENT, CORS_ORIGINS or <PROVIDER>_API_KEY / <PROVIDER>_BASE_URL.
# api_key also accepts \"env:VAR_NAME\" to read the key from another variable.
";

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./gateway-config.yaml)
        #[arg(short, long, default_value = "./gateway-config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, force } => generate(&output, force).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GatewayConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  --config flag: {}", path.display());
        } else {
            println!("  --config flag: {}", "(not set)".dimmed());
        }
        for (idx, path) in GatewayConfig::search_paths().iter().enumerate() {
            let marker = if path.exists() {
                "found".green()
            } else {
                "missing".dimmed()
            };
            println!("  {}. {} ({})", idx + 1, path.display(), marker);
        }
        println!(
            "  {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Server:".bold());
    println!("  Bind: {}:{}", config.server.host, config.server.port);
    println!("  Environment: {}", config.server.environment.as_str());
    println!("  CORS origins: {}", config.server.cors_origins.join(", "));
    match config.server.metrics_port {
        Some(port) => println!("  Metrics port: {}", port),
        None => println!("  Metrics port: {}", "(disabled)".dimmed()),
    }
    println!();

    println!("{}", "Providers:".bold());
    for (kind, settings) in &config.providers {
        let state = if !settings.enabled {
            "disabled".dimmed()
        } else if settings.has_credentials(*kind) {
            "configured".green()
        } else {
            "no default credentials".yellow()
        };
        println!("  {} ({})", kind.display_name().bold(), state);
        let endpoint = if settings.base_url.is_empty() {
            "(must be supplied per request)".to_string()
        } else {
            settings.base_url.clone()
        };
        println!("    Endpoint: {}", endpoint);
        if !settings.default_model.is_empty() {
            println!("    Default model: {}", settings.default_model);
        }
        if !settings.embedding_model.is_empty() {
            println!("    Embedding model: {}", settings.embedding_model);
        }
        println!(
            "    Limits: max_tokens={} temperature={} timeout={}s",
            settings.max_tokens, settings.temperature, settings.timeout_secs
        );
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GatewayConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    let enabled = config.enabled_providers().count();
    println!("{}", "✓ Configuration is valid".green());
    println!("  {} provider(s) enabled", enabled);

    Ok(())
}

async fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            output.display()
        );
    }

    let sample = render_sample()?;
    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

/// Default configuration as commented YAML
fn render_sample() -> Result<String> {
    let yaml = serde_yaml::to_string(&GatewayConfig::default())
        .context("Failed to serialize default configuration")?;
    Ok(format!("{}\n{}", GENERATED_HEADER, yaml))
}
