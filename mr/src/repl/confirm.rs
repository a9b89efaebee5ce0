//! Tool call confirmation
//!
//! Every tool call passes through an [`Approver`] before it is dispatched.
//! Decline is an ordinary value the turn loop consumes, not an error.

use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::Value;
use tracing::debug;

/// A tool call the model has requested but that has not yet been approved
///
/// Ephemeral: consumed by confirmation and dispatch, or discarded on decline.
/// Never persisted in this form.
#[derive(Debug, Clone)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Operator decision for one pending tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Declined,
}

/// Decides whether a pending tool call may execute
#[async_trait]
pub trait Approver: Send + Sync {
    async fn confirm(&self, call: &PendingToolCall) -> Decision;
}

/// Approves every call without prompting, for unattended operation
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn confirm(&self, call: &PendingToolCall) -> Decision {
        debug!(name = %call.name, "confirm: auto-approved");
        println!("{} {}", "Auto-approving tool execution:".yellow(), call.name.bright_white());
        Decision::Approved
    }
}

/// Prompts the operator for an explicit accept/decline
///
/// The prompt goes through rustyline so Ctrl-C aborts only this tool call:
/// an interrupt, Ctrl-D, or any answer other than an explicit yes declines.
/// A decline never closes any session.
pub struct StdinApprover;

#[async_trait]
impl Approver for StdinApprover {
    async fn confirm(&self, call: &PendingToolCall) -> Decision {
        println!();
        println!("{} {}", "Tool:".bright_yellow(), call.name.bright_white());
        if let Ok(pretty) = serde_json::to_string_pretty(&call.arguments) {
            println!("{}", pretty.dimmed());
        }

        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(_) => return Decision::Declined,
        };

        let readline = rl.readline(&format!("{} ", "Execute? [y/N]".bright_yellow()));
        if matches!(readline, Err(ReadlineError::Interrupted)) {
            println!("^C");
        }
        read_decision(readline)
    }
}

/// Map the operator's answer to a decision; only an explicit yes approves
fn read_decision(readline: Result<String, ReadlineError>) -> Decision {
    match readline {
        Ok(line) => match line.trim().to_lowercase().as_str() {
            "y" | "yes" => Decision::Approved,
            _ => Decision::Declined,
        },
        Err(_) => Decision::Declined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_auto_approve_always_approves() {
        let call = PendingToolCall {
            id: "toolu_01".to_string(),
            name: "list_tables".to_string(),
            arguments: json!({}),
        };

        assert_eq!(AutoApprove.confirm(&call).await, Decision::Approved);
    }

    #[test]
    fn test_read_decision_only_explicit_yes_approves() {
        assert_eq!(read_decision(Ok("y".to_string())), Decision::Approved);
        assert_eq!(read_decision(Ok(" Yes ".to_string())), Decision::Approved);
        assert_eq!(read_decision(Ok("n".to_string())), Decision::Declined);
        assert_eq!(read_decision(Ok("".to_string())), Decision::Declined);
    }

    #[test]
    fn test_read_decision_interrupt_declines() {
        // Ctrl-C at the confirmation prompt aborts only this tool call
        assert_eq!(read_decision(Err(ReadlineError::Interrupted)), Decision::Declined);
        assert_eq!(read_decision(Err(ReadlineError::Eof)), Decision::Declined);
    }
}
