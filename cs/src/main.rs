use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use chatstore::cli::{Cli, Command};
use chatstore::config::Config;
use chatstore::message::{ContentBlock, MessageContent, Role};
use chatstore::store::ChatStore;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("chatstore starting");

    match cli.command {
        Command::List => {
            let store = ChatStore::open(&config.chat_dir)?;
            let chats = store.list()?;
            if chats.is_empty() {
                println!("No chat logs found");
            } else {
                for chat_id in chats {
                    println!("{}", chat_id);
                }
            }
        }
        Command::Show { chat_id } => {
            let store = ChatStore::open(&config.chat_dir)?;
            let log = store.load(&chat_id)?;
            print_history(&log);
        }
        Command::Delete { chat_id } => {
            let store = ChatStore::open(&config.chat_dir)?;
            store.delete(&chat_id)?;
            println!("{} Deleted chat: {}", "✓".green(), chat_id);
        }
        Command::Dir => {
            println!("{}", config.chat_dir.display());
        }
    }

    Ok(())
}

fn print_history(log: &chatstore::ChatLog) {
    for msg in log.snapshot() {
        let role = match msg.role {
            Role::User => "user".bright_green().bold(),
            Role::Assistant => "assistant".bright_blue().bold(),
        };
        println!("{}", role);

        match &msg.content {
            MessageContent::Text(text) => println!("  {}", text),
            MessageContent::Blocks(blocks) => {
                for block in blocks {
                    match block {
                        ContentBlock::Text { text } => println!("  {}", text),
                        ContentBlock::ToolUse { id, name, input } => {
                            println!("  {} {} {}", "[tool_use]".yellow(), name.bright_white(), id.dimmed());
                            println!("  {}", input.to_string().dimmed());
                        }
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => {
                            let tag = if *is_error {
                                "[tool_result:error]".red()
                            } else {
                                "[tool_result]".cyan()
                            };
                            println!("  {} {}", tag, tool_use_id.dimmed());
                            println!("  {}", content.dimmed());
                        }
                    }
                }
            }
        }
        println!();
    }
}
