//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// mcprepl - MCP tool-orchestrating REPL
#[derive(Parser)]
#[command(
    name = "mr",
    about = "Interactive REPL that routes LLM tool calls to MCP servers",
    version,
)]
pub struct Cli {
    /// Path to config file listing the MCP servers to connect
    #[arg(short, long, help = "Path to config file")]
    pub config: PathBuf,

    /// Approve every tool call without prompting
    #[arg(short = 'y', long = "auto-approve")]
    pub auto_approve: bool,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Initial query to run before the interactive prompt
    pub query: Option<String>,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mcprepl")
        .join("logs")
        .join("mcprepl.log");
    debug!(?path, "get_log_path: returning path");
    path
}
