//! CLI argument parsing for chatstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cs")]
#[command(author, version, about = "Inspect persisted mcprepl chat logs", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all persisted chat sessions
    List,

    /// Show the full message history of a chat session
    Show {
        /// Chat session id
        #[arg(required = true)]
        chat_id: String,
    },

    /// Delete a chat session's log
    Delete {
        /// Chat session id
        #[arg(required = true)]
        chat_id: String,
    },

    /// Print the chat log directory
    Dir,
}
