// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # LLM Gateway CLI
//!
//! The `llm-gateway` binary serves the gateway HTTP API and offers a few
//! offline helpers around its configuration.
//!
//! ## Commands
//!
//! - `llm-gateway serve` - Run the HTTP server (default when no command is given)
//! - `llm-gateway config show|validate|generate` - Configuration management
//! - `llm-gateway providers [--probe]` - Provider catalogue and credential status
//!
//! A `.env` file in the working directory is loaded before arguments are
//! parsed; variables already set in the environment take precedence.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod server;

use commands::ConfigCommand;

/// LLM Gateway - One HTTP surface for many model providers
#[derive(Parser)]
#[command(name = "llm-gateway")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP bind host (overrides configuration)
    #[arg(long, global = true)]
    host: Option<String>,

    /// HTTP port (overrides configuration)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway HTTP server
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List providers, their operations and credential status
    #[command(name = "providers")]
    Providers {
        /// Contact every enabled provider and report reachability
        #[arg(long)]
        probe: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so `env = ...` arguments see the file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => {
            server::serve(cli.config, cli.host, cli.port, &cli.log_level).await
        }
        Some(Commands::Config { command }) => {
            init_logging(&cli.log_level, LogFormat::Compact)?;
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Providers { probe }) => {
            init_logging(&cli.log_level, LogFormat::Compact)?;
            commands::providers::handle_command(cli.config, probe).await
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Compact,
    Json,
}

/// Initialize tracing subscriber for logging. `RUST_LOG` wins over `level`.
pub(crate) fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => builder.with_target(false).compact().init(),
        LogFormat::Json => builder.with_target(true).json().init(),
    }

    Ok(())
}
