//! Claude Code stream-json output parsing

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::provider::parser_util::{Line, classify, fallback, value_to_text};
use crate::provider::stream::StreamParser;
use crate::{StreamChunk, ToolCall, Usage};

/// Top-level lines of `--output-format stream-json`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClaudeEvent {
    System {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Partial-message envelope (`--include-partial-messages`)
    StreamEvent { event: MessageEvent },
    Assistant {
        #[serde(default)]
        message: WholeMessage,
    },
    User {
        #[serde(default)]
        message: WholeMessage,
    },
    Result {
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        usage: Option<RawUsage>,
    },
}

/// Messages-API streaming events
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum MessageEvent {
    MessageStart {
        #[serde(default)]
        message: Value,
    },
    ContentBlockStart {
        index: u32,
        content_block: BlockStart,
    },
    ContentBlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        #[serde(default)]
        usage: Option<RawUsage>,
    },
    MessageStop,
    Ping,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BlockStart {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BlockDelta {
    #[serde(rename = "type")]
    pub delta_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub partial_json: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WholeMessage {
    #[serde(default)]
    pub content: Value,
}

/// Content blocks of a whole assistant/user message
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct RawUsage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
}

/// A tool_use block whose input is still streaming
#[derive(Debug, Default)]
struct PendingTool {
    id: String,
    name: String,
    input_json: String,
}

/// Fold state for one Claude request
#[derive(Debug, Default)]
pub struct ClaudeParser {
    /// tool_use blocks keyed by content block index
    pending: HashMap<u32, PendingTool>,
    /// tool ids already surfaced as `tool_use`, with name and input
    tools: HashMap<String, (String, Value)>,
    /// tool ids already surfaced as `tool_result`
    finished: HashSet<String>,
    /// partial deltas seen, so whole messages repeat them
    streamed: bool,
    usage: Option<RawUsage>,
}

impl ClaudeParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_message_event(&mut self, event: MessageEvent) -> Vec<StreamChunk> {
        match event {
            MessageEvent::MessageStart { message } => {
                if let Some(usage) = message
                    .get("usage")
                    .and_then(|u| serde_json::from_value::<RawUsage>(u.clone()).ok())
                {
                    self.merge_usage(usage);
                }
                Vec::new()
            }
            MessageEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block.block_type.as_str() {
                "tool_use" | "server_tool_use" => {
                    self.pending.insert(
                        index,
                        PendingTool {
                            id: content_block.id.unwrap_or_else(|| format!("tool-{}", index)),
                            name: content_block.name.unwrap_or_else(|| "tool".to_string()),
                            input_json: String::new(),
                        },
                    );
                    Vec::new()
                }
                "text" => match content_block.text {
                    Some(text) if !text.is_empty() => {
                        self.streamed = true;
                        vec![StreamChunk::text(text)]
                    }
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            },
            MessageEvent::ContentBlockDelta { index, delta } => match delta.delta_type.as_str() {
                "text_delta" => {
                    self.streamed = true;
                    delta.text.map(StreamChunk::text).into_iter().collect()
                }
                "thinking_delta" => {
                    self.streamed = true;
                    delta.thinking.map(StreamChunk::thinking).into_iter().collect()
                }
                "input_json_delta" => {
                    if let (Some(tool), Some(fragment)) = (self.pending.get_mut(&index), delta.partial_json) {
                        tool.input_json.push_str(&fragment);
                    }
                    Vec::new()
                }
                _ => Vec::new(),
            },
            MessageEvent::ContentBlockStop { index } => match self.pending.remove(&index) {
                Some(tool) => {
                    let input = parse_tool_input(&tool.input_json);
                    self.surface_tool(tool.id, tool.name, input).into_iter().collect()
                }
                None => Vec::new(),
            },
            MessageEvent::MessageDelta { usage } => {
                if let Some(usage) = usage {
                    self.merge_usage(usage);
                }
                Vec::new()
            }
            MessageEvent::MessageStop | MessageEvent::Ping => Vec::new(),
        }
    }

    fn on_whole_message(&mut self, message: WholeMessage) -> Vec<StreamChunk> {
        let blocks = match message.content {
            Value::Array(blocks) => blocks,
            // plain string content is the echoed prompt
            _ => return Vec::new(),
        };

        let mut chunks = Vec::new();
        for block in blocks {
            let Ok(block) = serde_json::from_value::<ContentBlock>(block) else {
                continue;
            };
            match block {
                ContentBlock::Text { text } if !self.streamed && !text.is_empty() => {
                    chunks.push(StreamChunk::text(text));
                }
                ContentBlock::Thinking { thinking } if !self.streamed && !thinking.is_empty() => {
                    chunks.push(StreamChunk::thinking(thinking));
                }
                ContentBlock::ToolUse { id, name, input } => {
                    chunks.extend(self.surface_tool(id, name, input));
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    if !self.finished.insert(tool_use_id.clone()) {
                        continue;
                    }
                    let (name, input) = self
                        .tools
                        .get(&tool_use_id)
                        .cloned()
                        .unwrap_or_else(|| ("tool".to_string(), Value::Null));
                    chunks.push(StreamChunk::tool_result(ToolCall::finished(
                        tool_use_id,
                        name,
                        input,
                        value_to_text(&content),
                        is_error,
                    )));
                }
                _ => {}
            }
        }
        chunks
    }

    /// `tool_use` for a tool id not surfaced yet
    fn surface_tool(&mut self, id: String, name: String, input: Value) -> Option<StreamChunk> {
        if self.tools.contains_key(&id) {
            return None;
        }
        self.tools.insert(id.clone(), (name.clone(), input.clone()));
        Some(StreamChunk::tool_use(ToolCall::running(id, name, input)))
    }

    fn merge_usage(&mut self, update: RawUsage) {
        let current = self.usage.get_or_insert_with(RawUsage::default);
        current.input_tokens = update.input_tokens.or(current.input_tokens);
        current.output_tokens = update.output_tokens.or(current.output_tokens);
        current.cache_creation_input_tokens = update
            .cache_creation_input_tokens
            .or(current.cache_creation_input_tokens);
        current.cache_read_input_tokens = update
            .cache_read_input_tokens
            .or(current.cache_read_input_tokens);
    }
}

/// Accumulated `input_json_delta` text, parsed once the block closed
fn parse_tool_input(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl StreamParser for ClaudeParser {
    fn parse_line(&mut self, line: &str) -> Vec<StreamChunk> {
        let event = match classify::<ClaudeEvent>(line) {
            Some(Line::Event(event)) => event,
            Some(other) => return fallback(other),
            None => return Vec::new(),
        };

        match event {
            ClaudeEvent::System {
                subtype,
                session_id,
            } => match (subtype.as_deref(), session_id) {
                (Some("init"), Some(id)) if !id.is_empty() => vec![StreamChunk::session_active(id)],
                _ => Vec::new(),
            },
            ClaudeEvent::StreamEvent { event } => self.on_message_event(event),
            ClaudeEvent::Assistant { message } | ClaudeEvent::User { message } => {
                self.on_whole_message(message)
            }
            ClaudeEvent::Result {
                is_error,
                result,
                usage,
            } => {
                if self.usage.is_none() {
                    self.usage = usage;
                }
                if is_error {
                    let message = result
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| "Claude Code reported an error".to_string());
                    vec![StreamChunk::error(message)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn take_usage(&mut self) -> Option<Usage> {
        self.usage.take().map(|raw| Usage {
            input_tokens: raw.input_tokens.unwrap_or(0),
            output_tokens: raw.output_tokens.unwrap_or(0),
            cache_creation_input_tokens: raw.cache_creation_input_tokens,
            cache_read_input_tokens: raw.cache_read_input_tokens,
        })
    }
}
