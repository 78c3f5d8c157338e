//! Codex CLI JSON output parser
//!
//! `codex exec --json` output format:
//! - `thread.started` - session id for `resume`
//! - `item.started` / `item.updated` / `item.completed` - typed work items
//! - `turn.completed` - task finished (with usage stats)
//! - `turn.failed` / `error` - failures

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::provider::parser_util::{Line, classify, fallback, fallback_text, retag_thinking, value_to_text};
use crate::provider::stream::StreamParser;
use crate::{StreamChunk, ToolCall, Usage};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum CodexEvent {
    #[serde(rename = "thread.started")]
    ThreadStarted { thread_id: String },
    #[serde(rename = "turn.started")]
    TurnStarted,
    #[serde(rename = "turn.completed")]
    TurnCompleted {
        #[serde(default)]
        usage: Option<CodexUsage>,
    },
    #[serde(rename = "turn.failed")]
    TurnFailed {
        #[serde(default)]
        error: Value,
    },
    #[serde(rename = "item.started")]
    ItemStarted { item: Item },
    #[serde(rename = "item.updated")]
    ItemUpdated { item: Item },
    #[serde(rename = "item.completed")]
    ItemCompleted { item: Item },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct CodexUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub cached_input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// A work item; fields depend on `type`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", alias = "item_type")]
    pub item_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    fn has(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Started,
    Updated,
    Completed,
}

/// Fold state for one Codex request
#[derive(Debug, Default)]
pub struct CodexParser {
    /// tool items surfaced as `tool_use`
    started: HashSet<String>,
    /// tool items surfaced as `tool_result`
    completed: HashSet<String>,
    /// agent messages already emitted, so later ones get a paragraph break
    messages: usize,
    /// synthesized ids for items reported without one
    next_anonymous: usize,
    usage: Option<Usage>,
    turn_completed: bool,
    /// `error` events; transient unless the turn never completes
    last_error: Option<String>,
}

impl CodexParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_item(&mut self, mut item: Item, phase: Phase) -> Vec<StreamChunk> {
        if item.id.is_empty() {
            self.next_anonymous += 1;
            item.id = format!("item-{}", self.next_anonymous);
        }
        match item.item_type.as_str() {
            "agent_message" => {
                if phase != Phase::Completed {
                    return Vec::new();
                }
                let Some(text) = item.str_field("text").filter(|t| !t.is_empty()) else {
                    return Vec::new();
                };
                let text = if self.messages > 0 {
                    format!("\n\n{}", text)
                } else {
                    text.to_string()
                };
                self.messages += 1;
                vec![StreamChunk::text(text)]
            }
            "reasoning" => {
                if phase != Phase::Completed {
                    return Vec::new();
                }
                match item.str_field("text").filter(|t| !t.trim().is_empty()) {
                    Some(text) => vec![as_thinking(text)],
                    None => Vec::new(),
                }
            }
            "command_execution" => {
                let command = item.str_field("command").unwrap_or("").to_string();
                let done = item.has("exit_code") || matches!(item.status(), Some("completed" | "failed"));
                let completion = done.then(|| {
                    let failed = item.status() == Some("failed")
                        || item.fields.get("exit_code").and_then(Value::as_i64).is_some_and(|c| c != 0);
                    let output = item.str_field("aggregated_output").unwrap_or("").to_string();
                    (output, failed)
                });
                self.on_tool(&item.id, "command_execution", json!({ "command": command }), completion)
            }
            "mcp_tool_call" => {
                let name = match (item.str_field("server"), item.str_field("tool")) {
                    (Some(server), Some(tool)) => format!("{}.{}", server, tool),
                    (None, Some(tool)) => tool.to_string(),
                    _ => "mcp_tool_call".to_string(),
                };
                let input = item.fields.get("arguments").cloned().unwrap_or(Value::Null);
                let done = matches!(item.status(), Some("completed" | "failed"))
                    || item.has("result")
                    || item.has("error");
                let completion = done.then(|| {
                    let failed = item.status() == Some("failed") || item.has("error");
                    let output = match (item.fields.get("error"), item.fields.get("result")) {
                        (Some(err), _) if !err.is_null() => value_to_text(err.get("message").unwrap_or(err)),
                        (_, Some(result)) => value_to_text(result.get("content").unwrap_or(result)),
                        _ => String::new(),
                    };
                    (output, failed)
                });
                self.on_tool(&item.id, &name, input, completion)
            }
            "file_change" => {
                let changes = item.fields.get("changes").cloned().unwrap_or(Value::Null);
                let done = phase == Phase::Completed || matches!(item.status(), Some("completed" | "failed"));
                let completion = done.then(|| (describe_changes(&changes), item.status() == Some("failed")));
                self.on_tool(&item.id, "file_change", json!({ "changes": changes }), completion)
            }
            "web_search" => {
                let query = item.str_field("query").unwrap_or("").to_string();
                let completion = (phase == Phase::Completed).then(|| (String::new(), false));
                self.on_tool(&item.id, "web_search", json!({ "query": query }), completion)
            }
            "todo_list" => {
                let items = item.fields.get("items").cloned().unwrap_or(Value::Null);
                let completion = (phase == Phase::Completed).then(|| (describe_todos(&items), false));
                self.on_tool(&item.id, "todo_list", json!({ "items": items }), completion)
            }
            "error" => {
                if let Some(message) = item.str_field("message") {
                    self.last_error = Some(message.to_string());
                }
                Vec::new()
            }
            _ => {
                if phase != Phase::Completed {
                    return Vec::new();
                }
                fallback_text(&Value::Object(item.fields))
                    .map(|text| vec![retag_thinking(&text)])
                    .unwrap_or_default()
            }
        }
    }

    /// `tool_use` on first sight, one `tool_result` once complete
    fn on_tool(
        &mut self,
        id: &str,
        name: &str,
        input: Value,
        completion: Option<(String, bool)>,
    ) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        if self.started.insert(id.to_string()) {
            chunks.push(StreamChunk::tool_use(ToolCall::running(id, name, input.clone())));
        }
        if let Some((output, failed)) = completion {
            if self.completed.insert(id.to_string()) {
                chunks.push(StreamChunk::tool_result(ToolCall::finished(
                    id, name, input, output, failed,
                )));
            }
        }
        chunks
    }
}

/// Reasoning summaries arrive as `**Heading**` or plain text; both are thinking
fn as_thinking(text: &str) -> StreamChunk {
    match retag_thinking(text) {
        StreamChunk::Text { content } => StreamChunk::thinking(content),
        thinking => thinking,
    }
}

fn describe_changes(changes: &Value) -> String {
    changes
        .as_array()
        .map(|changes| {
            changes
                .iter()
                .filter_map(|c| {
                    let path = c.get("path").and_then(Value::as_str)?;
                    let kind = c.get("kind").and_then(Value::as_str).unwrap_or("update");
                    Some(format!("{} {}", kind, path))
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

fn describe_todos(items: &Value) -> String {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| {
                    let text = i.get("text").and_then(Value::as_str)?;
                    let done = i.get("completed").and_then(Value::as_bool).unwrap_or(false);
                    Some(format!("[{}] {}", if done { "x" } else { " " }, text))
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

impl StreamParser for CodexParser {
    fn parse_line(&mut self, line: &str) -> Vec<StreamChunk> {
        let event = match classify::<CodexEvent>(line) {
            Some(Line::Event(event)) => event,
            Some(other) => return fallback(other),
            None => return Vec::new(),
        };

        match event {
            CodexEvent::ThreadStarted { thread_id } => vec![StreamChunk::session_active(thread_id)],
            CodexEvent::TurnStarted => Vec::new(),
            CodexEvent::TurnCompleted { usage } => {
                self.turn_completed = true;
                self.last_error = None;
                if let Some(u) = usage {
                    let total = self.usage.get_or_insert_with(Usage::default);
                    total.input_tokens += u.input_tokens;
                    total.output_tokens += u.output_tokens;
                    if u.cached_input_tokens > 0 {
                        *total.cache_read_input_tokens.get_or_insert(0) += u.cached_input_tokens;
                    }
                }
                Vec::new()
            }
            CodexEvent::TurnFailed { error } => {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| self.last_error.take())
                    .unwrap_or_else(|| "Codex turn failed".to_string());
                vec![StreamChunk::error(message)]
            }
            CodexEvent::ItemStarted { item } => self.on_item(item, Phase::Started),
            CodexEvent::ItemUpdated { item } => self.on_item(item, Phase::Updated),
            CodexEvent::ItemCompleted { item } => self.on_item(item, Phase::Completed),
            CodexEvent::Error { message } => {
                // reconnect notices also arrive as `error`
                if let Some(message) = message {
                    self.last_error = Some(message);
                }
                Vec::new()
            }
        }
    }

    fn take_usage(&mut self) -> Option<Usage> {
        self.usage.take()
    }

    fn turn_completed(&self) -> bool {
        self.turn_completed
    }

    fn finish(&mut self) -> Vec<StreamChunk> {
        match self.last_error.take() {
            Some(message) if !self.turn_completed => vec![StreamChunk::error(message)],
            _ => Vec::new(),
        }
    }
}
