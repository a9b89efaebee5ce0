//! mcprepl - MCP tool-orchestrating REPL
//!
//! CLI entry point: set up file logging, load the config, and hand off to
//! the interactive loop.

use std::fs;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use mcprepl::cli::{Cli, get_log_path};
use mcprepl::config::Config;
use mcprepl::repl;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    // Logs go to a file so tracing output never interleaves with the REPL
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let level = match cli_log_level.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(&cli.config).context("Failed to load configuration")?;
    info!(
        model = %config.llm.model,
        server_count = config.servers.len(),
        "mcprepl loaded config"
    );

    repl::run_interactive(&config, cli.auto_approve, cli.query).await
}
