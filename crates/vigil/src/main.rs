//! Vigil - Service discovery and span classification agent
//!
//! # Usage
//!
//! ```bash
//! # Run the agent (default)
//! vigil
//! vigil --config vigil.toml
//!
//! # Feed recorded spans instead of kernel capture
//! vigil run --replay spans.ndjson
//!
//! # Validate a configuration
//! vigil check --config vigil.toml
//!
//! # Show how paths are classified
//! vigil route --config vigil.toml /user/1234 /customer/1/job/2
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vigil_config::{Config, LogFormat, process_env};

/// Vigil - Service discovery and span classification agent
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (environment overrides still apply)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the agent
    Run(cmd::run::RunArgs),

    /// Validate the configuration and print a summary
    Check,

    /// Print the route each path classifies to
    Route(cmd::route::RouteArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::read(cli.config.as_deref(), process_env);

    match cli.command {
        Some(Command::Check) => {
            // Check doesn't need logging - just outputs to stdout
            cmd::check::run(loaded)
        }
        Some(Command::Route(args)) => {
            let config = loaded.context("failed to load configuration")?;
            cmd::route::run(&config, args)
        }
        // No subcommand = run the agent
        command => {
            let args = match command {
                Some(Command::Run(args)) => args,
                _ => cmd::run::RunArgs::default(),
            };
            let config = loaded.context("failed to load configuration")?;
            let level = resolve_log_level(cli.log_level.as_deref(), &config);
            init_logging(&level, config.log.format)?;
            cmd::run::run(config, args).await
        }
    }
}

/// Resolve log level: CLI flag > config > default "info"
fn resolve_log_level(cli_level: Option<&str>, config: &Config) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => config.log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (console, json) = match format {
        LogFormat::Console => (
            Some(fmt::layer().with_target(true).with_thread_ids(false)),
            None,
        ),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(false))),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(json)
        .with(filter)
        .init();

    Ok(())
}
