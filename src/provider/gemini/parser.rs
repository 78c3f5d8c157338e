//! Gemini CLI stream-json output parsing
//!
//! One flat JSON object per line: `init`, `message`, `tool_use`,
//! `tool_result`, `error`, `result`. Copilot's JSON mode uses the same shape.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::provider::parser_util::{Line, classify, fallback, retag_thinking, value_to_text};
use crate::provider::stream::StreamParser;
use crate::{StreamChunk, ToolCall, Usage};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum FlatEvent {
    Init {
        #[serde(default)]
        session_id: Option<String>,
    },
    Message {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        content: Value,
    },
    #[serde(alias = "thinking")]
    Thought {
        #[serde(default, alias = "text", alias = "subject")]
        content: Value,
    },
    ToolUse {
        #[serde(default, alias = "id")]
        tool_id: Option<String>,
        #[serde(default, alias = "name")]
        tool_name: Option<String>,
        #[serde(default, alias = "input", alias = "args")]
        parameters: Value,
    },
    ToolResult {
        #[serde(default, alias = "id")]
        tool_id: Option<String>,
        #[serde(default)]
        status: Option<String>,
        #[serde(default, alias = "result")]
        output: Value,
        #[serde(default)]
        error: Value,
    },
    Error {
        #[serde(default)]
        severity: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        error: Value,
        #[serde(default)]
        stats: Option<FlatStats>,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct FlatStats {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Fold state for one Gemini (or Copilot JSON) request
#[derive(Debug)]
pub struct GeminiParser {
    /// Name used in error messages
    provider_name: &'static str,
    /// surfaced tool ids, with name and input
    tools: HashMap<String, (String, Value)>,
    finished: HashSet<String>,
    /// synthesized ids for tools reported without one
    next_anonymous: usize,
    usage: Option<Usage>,
}

impl Default for GeminiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiParser {
    pub fn new() -> Self {
        Self::for_provider("Gemini")
    }

    pub(crate) fn for_provider(provider_name: &'static str) -> Self {
        Self {
            provider_name,
            tools: HashMap::new(),
            finished: HashSet::new(),
            next_anonymous: 0,
            usage: None,
        }
    }

    pub(crate) fn on_event(&mut self, event: FlatEvent) -> Vec<StreamChunk> {
        match event {
            FlatEvent::Init { session_id } => session_id
                .filter(|id| !id.is_empty())
                .map(StreamChunk::session_active)
                .into_iter()
                .collect(),
            FlatEvent::Message { role, content } => {
                // the CLI echoes the prompt as a user message
                if role.as_deref() == Some("user") {
                    return Vec::new();
                }
                match value_to_text(&content) {
                    text if text.is_empty() => Vec::new(),
                    text => vec![retag_thinking(&text)],
                }
            }
            FlatEvent::Thought { content } => match value_to_text(&content) {
                text if text.trim().is_empty() => Vec::new(),
                text => vec![StreamChunk::thinking(text)],
            },
            FlatEvent::ToolUse {
                tool_id,
                tool_name,
                parameters,
            } => {
                let id = tool_id.unwrap_or_else(|| {
                    self.next_anonymous += 1;
                    format!("tool-{}", self.next_anonymous)
                });
                if self.tools.contains_key(&id) {
                    return Vec::new();
                }
                let name = tool_name.unwrap_or_else(|| "tool".to_string());
                self.tools.insert(id.clone(), (name.clone(), parameters.clone()));
                vec![StreamChunk::tool_use(ToolCall::running(id, name, parameters))]
            }
            FlatEvent::ToolResult {
                tool_id,
                status,
                output,
                error,
            } => {
                let id = tool_id.unwrap_or_else(|| format!("tool-{}", self.next_anonymous));
                if !self.finished.insert(id.clone()) {
                    return Vec::new();
                }
                let failed = status.as_deref().is_some_and(|s| s != "success") || !error.is_null();
                let output = if !error.is_null() {
                    value_to_text(error.get("message").unwrap_or(&error))
                } else {
                    value_to_text(&output)
                };
                let (name, input) = self
                    .tools
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| ("tool".to_string(), Value::Null));
                vec![StreamChunk::tool_result(ToolCall::finished(
                    id, name, input, output, failed,
                ))]
            }
            FlatEvent::Error { severity, message } => {
                let message = message.unwrap_or_else(|| format!("{} reported an error", self.provider_name));
                if severity.as_deref() == Some("warning") {
                    vec![StreamChunk::thinking(format!("Warning: {}", message))]
                } else {
                    vec![StreamChunk::error(message)]
                }
            }
            FlatEvent::Result {
                status,
                error,
                stats,
            } => {
                if let Some(stats) = stats {
                    self.usage = Some(Usage::new(stats.input_tokens, stats.output_tokens));
                }
                let failed = status.as_deref().is_some_and(|s| s != "success") || !error.is_null();
                if failed {
                    let message = match error.get("message").and_then(Value::as_str) {
                        Some(m) => m.to_string(),
                        None => format!("{} reported an error", self.provider_name),
                    };
                    vec![StreamChunk::error(message)]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

impl StreamParser for GeminiParser {
    fn parse_line(&mut self, line: &str) -> Vec<StreamChunk> {
        match classify::<FlatEvent>(line) {
            Some(Line::Event(event)) => self.on_event(event),
            Some(other) => fallback(other),
            None => Vec::new(),
        }
    }

    fn take_usage(&mut self) -> Option<Usage> {
        self.usage.take()
    }
}
