//! Turn orchestration state machine
//!
//! One turn drives a single user query: append it to the log, call the model,
//! walk the returned content blocks in order, and run at most one confirmed
//! tool call before going back to the model with the recorded result. The
//! model is never called again until the previous tool's result (or the
//! decline) has been written to the log.

use colored::Colorize;
use tracing::{debug, error, warn};

use chatstore::{ChatLog, ContentBlock, Message};

use crate::llm::{CompletionRequest, LlmClient, LlmError, StopReason};
use crate::mcp::ToolDispatch;

use super::confirm::{Approver, Decision, PendingToolCall};

/// Tool output shown on the terminal is cut at this length; the full payload
/// still goes to the model and the log.
const DISPLAY_TRUNCATE_CHARS: usize = 500;

/// How one turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model finished its response with no pending tool call
    Completed,
    /// The operator declined a tool call; the turn ended early
    Cancelled,
}

/// Drives one user query to completion
pub struct TurnEngine<'a> {
    llm: &'a dyn LlmClient,
    tools: &'a dyn ToolDispatch,
    approver: &'a dyn Approver,
    log: &'a mut ChatLog,
    system_prompt: &'a str,
    max_tokens: u32,
}

impl<'a> TurnEngine<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        tools: &'a dyn ToolDispatch,
        approver: &'a dyn Approver,
        log: &'a mut ChatLog,
        system_prompt: &'a str,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            tools,
            approver,
            log,
            system_prompt,
            max_tokens,
        }
    }

    /// Run one full turn for `query`
    ///
    /// A model call failure aborts the turn; everything persisted so far
    /// stays in the log.
    pub async fn run_turn(&mut self, query: &str) -> Result<TurnOutcome, LlmError> {
        debug!(chat_id = %self.log.chat_id(), "run_turn: called");
        self.record(Message::user(query));

        loop {
            let request = CompletionRequest {
                system_prompt: self.system_prompt.to_string(),
                messages: self.log.snapshot().to_vec(),
                tools: self.tools.catalog(),
                max_tokens: self.max_tokens,
            };

            let response = self.llm.complete(request).await?;
            debug!(
                block_count = response.content.len(),
                stop_reason = ?response.stop_reason,
                "run_turn: model responded"
            );

            let mut buffered: Vec<ContentBlock> = Vec::new();
            let mut executed_tool = false;

            for block in response.content {
                match block {
                    ContentBlock::Text { text } => {
                        println!("{text}");
                        buffered.push(ContentBlock::text(text));
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        let pending = PendingToolCall {
                            id,
                            name,
                            arguments: input,
                        };

                        match self.approver.confirm(&pending).await {
                            Decision::Declined => {
                                // Drop the tool call and everything after it;
                                // text already produced is kept.
                                println!("{}", "Tool call declined.".yellow());
                                if !buffered.is_empty() {
                                    self.record(Message::assistant_blocks(buffered));
                                }
                                return Ok(TurnOutcome::Cancelled);
                            }
                            Decision::Approved => {
                                self.execute_tool(pending, std::mem::take(&mut buffered)).await;
                                executed_tool = true;
                                // Remaining blocks in this response are not
                                // processed; the next model call sees the
                                // recorded result.
                                break;
                            }
                        }
                    }
                    ContentBlock::ToolResult { .. } => {
                        // The model does not emit tool results
                        warn!("run_turn: ignoring tool_result block in model output");
                    }
                }
            }

            if executed_tool {
                continue;
            }

            if response.stop_reason == StopReason::MaxTokens {
                println!("{}", "[response truncated: max tokens reached]".yellow());
            }

            if !buffered.is_empty() {
                self.record(Message::assistant_blocks(buffered));
            }
            return Ok(TurnOutcome::Completed);
        }
    }

    /// Dispatch one approved tool call and record the exchange
    ///
    /// Dispatch failures become an error-flagged tool result fed back to the
    /// model; the turn continues either way.
    async fn execute_tool(&mut self, call: PendingToolCall, mut buffered: Vec<ContentBlock>) {
        debug!(name = %call.name, id = %call.id, "execute_tool: called");
        let (content, is_error) = match self.tools.dispatch(&call.name, call.arguments.clone()).await {
            Ok(outcome) => (outcome.content, outcome.is_error),
            Err(e) => {
                warn!(name = %call.name, error = %e, "execute_tool: dispatch failed");
                (e.to_string(), true)
            }
        };

        if is_error {
            println!("{} {}", "Error:".red(), truncate_for_display(&content));
        } else {
            println!("{}", truncate_for_display(&content).dimmed());
        }

        buffered.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name,
            input: call.arguments,
        });
        self.record(Message::assistant_blocks(buffered));
        self.record(Message::user_blocks(vec![ContentBlock::tool_result(
            &call.id, &content, is_error,
        )]));
    }

    /// Append and persist one message, reporting (not propagating) a failed
    /// log write
    fn record(&mut self, message: Message) {
        if let Err(e) = self.log.append(message) {
            error!(chat_id = %self.log.chat_id(), error = %e, "record: failed to persist chat log");
            eprintln!("{} {}", "Warning: failed to persist chat log:".red(), e);
        }
    }
}

fn truncate_for_display(content: &str) -> String {
    if content.chars().count() > DISPLAY_TRUNCATE_CHARS {
        let cut: String = content.chars().take(DISPLAY_TRUNCATE_CHARS).collect();
        format!("{}... ({} chars total)", cut, content.chars().count())
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    use chatstore::{ChatStore, Role};

    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, TokenUsage, ToolDefinition};
    use crate::mcp::{McpSession, SessionRegistry, StubTransport, ToolDispatcher};

    use super::super::confirm::AutoApprove;

    struct DeclineAll;

    #[async_trait::async_trait]
    impl Approver for DeclineAll {
        async fn confirm(&self, _call: &PendingToolCall) -> Decision {
            Decision::Declined
        }
    }

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition::new(name, "", json!({"type": "object"}))
    }

    fn response(blocks: Vec<ContentBlock>, stop_reason: StopReason) -> CompletionResponse {
        CompletionResponse {
            content: blocks,
            stop_reason,
            usage: TokenUsage::default(),
        }
    }

    fn two_server_dispatcher() -> ToolDispatcher {
        let mut registry = SessionRegistry::new();
        registry.push(McpSession::stubbed(
            "db.py",
            vec![tool("list_tables")],
            StubTransport {
                output: "3 tables".to_string(),
                ..Default::default()
            },
        ));
        registry.push(McpSession::stubbed(
            "kv.py",
            vec![tool("get_value")],
            StubTransport {
                output: "value".to_string(),
                ..Default::default()
            },
        ));
        ToolDispatcher::new(registry)
    }

    async fn run(
        llm: &MockLlmClient,
        dispatcher: &ToolDispatcher,
        approver: &dyn Approver,
        log: &mut ChatLog,
        query: &str,
    ) -> TurnOutcome {
        let mut engine = TurnEngine::new(llm, dispatcher, approver, log, "You are helpful", 4096);
        engine.run_turn(query).await.unwrap()
    }

    fn temp_log(dir: &TempDir) -> ChatLog {
        ChatStore::open(dir.path()).unwrap().create().unwrap()
    }

    #[tokio::test]
    async fn test_text_only_turn_completes() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![response(
            vec![ContentBlock::text("hello")],
            StopReason::EndTurn,
        )]);
        let dispatcher = two_server_dispatcher();

        let outcome = run(&llm, &dispatcher, &AutoApprove, &mut log, "hi").await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(llm.call_count(), 1);

        let messages = log.snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_approved_tool_call_records_three_messages_then_recalls_model() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![
            response(
                vec![
                    ContentBlock::text("checking..."),
                    ContentBlock::ToolUse {
                        id: "toolu_01".to_string(),
                        name: "list_tables".to_string(),
                        input: json!({}),
                    },
                ],
                StopReason::ToolUse,
            ),
            response(vec![ContentBlock::text("there are 3 tables")], StopReason::EndTurn),
        ]);
        let dispatcher = two_server_dispatcher();

        let outcome = run(&llm, &dispatcher, &AutoApprove, &mut log, "how many tables?").await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(llm.call_count(), 2);

        // user query, assistant(text + tool_use), user(tool_result), assistant(text)
        let messages = log.snapshot();
        assert_eq!(messages.len(), 4);

        let assistant_blocks = messages[1].content.blocks();
        assert!(matches!(&assistant_blocks[0], ContentBlock::Text { text } if text == "checking..."));
        assert!(matches!(&assistant_blocks[1], ContentBlock::ToolUse { name, .. } if name == "list_tables"));

        let result_blocks = messages[2].content.blocks();
        assert!(matches!(
            &result_blocks[0],
            ContentBlock::ToolResult { tool_use_id, is_error, .. }
                if tool_use_id == "toolu_01" && !*is_error
        ));

        // The second model call saw the history ending in the tool result
        let second_request = &llm.requests()[1];
        let last = second_request.messages.last().unwrap();
        assert!(matches!(&last.content.blocks()[0], ContentBlock::ToolResult { .. }));
    }

    #[tokio::test]
    async fn test_decline_keeps_prior_text_and_ends_turn() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![response(
            vec![
                ContentBlock::text("let me check"),
                ContentBlock::ToolUse {
                    id: "toolu_01".to_string(),
                    name: "list_tables".to_string(),
                    input: json!({}),
                },
                ContentBlock::text("after the call"),
            ],
            StopReason::ToolUse,
        )]);
        let dispatcher = two_server_dispatcher();

        let outcome = run(&llm, &dispatcher, &DeclineAll, &mut log, "check").await;

        assert_eq!(outcome, TurnOutcome::Cancelled);
        // No second model call after a decline
        assert_eq!(llm.call_count(), 1);

        let messages = log.snapshot();
        assert_eq!(messages.len(), 2);

        // Only the text seen before the tool call survives; the tool call and
        // the trailing text are gone.
        let blocks = messages[1].content.blocks();
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], ContentBlock::Text { text } if text == "let me check"));
    }

    #[tokio::test]
    async fn test_decline_with_no_prior_text_appends_nothing() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![response(
            vec![ContentBlock::ToolUse {
                id: "toolu_01".to_string(),
                name: "list_tables".to_string(),
                input: json!({}),
            }],
            StopReason::ToolUse,
        )]);
        let dispatcher = two_server_dispatcher();

        let outcome = run(&llm, &dispatcher, &DeclineAll, &mut log, "check").await;

        assert_eq!(outcome, TurnOutcome::Cancelled);
        // Only the user query was recorded
        assert_eq!(log.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_result_and_turn_continues() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![
            response(
                vec![ContentBlock::ToolUse {
                    id: "toolu_01".to_string(),
                    name: "no_such_tool".to_string(),
                    input: json!({}),
                }],
                StopReason::ToolUse,
            ),
            response(vec![ContentBlock::text("that tool does not exist")], StopReason::EndTurn),
        ]);
        let dispatcher = two_server_dispatcher();

        let outcome = run(&llm, &dispatcher, &AutoApprove, &mut log, "use it").await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(llm.call_count(), 2);

        let messages = log.snapshot();
        let result_blocks = messages[2].content.blocks();
        assert!(matches!(
            &result_blocks[0],
            ContentBlock::ToolResult { is_error, .. } if *is_error
        ));
    }

    #[tokio::test]
    async fn test_tool_result_persisted_before_next_model_call() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![
            response(
                vec![ContentBlock::ToolUse {
                    id: "toolu_01".to_string(),
                    name: "get_value".to_string(),
                    input: json!({"key": "a"}),
                }],
                StopReason::ToolUse,
            ),
            response(vec![ContentBlock::text("done")], StopReason::EndTurn),
        ]);
        let dispatcher = two_server_dispatcher();

        run(&llm, &dispatcher, &AutoApprove, &mut log, "get a").await;

        // Reload from disk: the snapshot the second call saw was durable
        let path = log.path().to_path_buf();
        let raw = std::fs::read_to_string(path).unwrap();
        let persisted: Vec<Message> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.len(), log.snapshot().len());
    }

    #[tokio::test]
    async fn test_catalog_passed_to_model_spans_all_sessions() {
        let dir = TempDir::new().unwrap();
        let mut log = temp_log(&dir);
        let llm = MockLlmClient::new(vec![response(vec![ContentBlock::text("ok")], StopReason::EndTurn)]);
        let dispatcher = two_server_dispatcher();

        run(&llm, &dispatcher, &AutoApprove, &mut log, "hi").await;

        let request = &llm.requests()[0];
        let names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list_tables", "get_value"]);
    }

    #[test]
    fn test_truncate_for_display_cuts_long_output() {
        let long = "x".repeat(600);
        let shown = truncate_for_display(&long);
        assert!(shown.starts_with(&"x".repeat(500)));
        assert!(shown.ends_with("(600 chars total)"));

        assert_eq!(truncate_for_display("short"), "short");
    }
}
