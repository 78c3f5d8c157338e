use serde::{Deserialize, Serialize};

/// Lifecycle state of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Announced but not started
    Pending,
    /// Tool is executing
    Running,
    /// Tool finished successfully
    Completed,
    /// Tool finished with an error
    Failed,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Pending => write!(f, "pending"),
            ToolStatus::Running => write!(f, "running"),
            ToolStatus::Completed => write!(f, "completed"),
            ToolStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A tool invocation reported by a provider CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned (or synthesized) id; `tool_use` and `tool_result`
    /// correlate by this alone
    pub id: String,

    /// Tool name (e.g., "Bash", "Read", "command_execution")
    pub name: String,

    /// Tool arguments
    #[serde(default)]
    pub input: serde_json::Value,

    /// Tool output, present on results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    pub status: ToolStatus,
}

impl ToolCall {
    /// A tool call that just started running
    pub fn running(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            output: None,
            status: ToolStatus::Running,
        }
    }

    /// A finished tool call
    pub fn finished(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
        output: impl Into<String>,
        failed: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            output: Some(output.into()),
            status: if failed {
                ToolStatus::Failed
            } else {
                ToolStatus::Completed
            },
        }
    }
}

/// Token usage reported at the end of a response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_input_tokens: None,
            cache_read_input_tokens: None,
        }
    }
}

/// One unit of normalized provider output.
///
/// Every request's sequence is closed by exactly one terminal chunk (`Done` or
/// `Error`), except when the caller cancels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Fragment of the assistant's answer
    Text { content: String },

    /// Fragment of the model's reasoning
    Thinking { content: String },

    /// A tool started running
    ToolUse {
        #[serde(rename = "toolCall")]
        tool_call: ToolCall,
    },

    /// A tool finished
    ToolResult {
        #[serde(rename = "toolCall")]
        tool_call: ToolCall,
    },

    /// Failure; carries a remediation command when authentication failed
    Error {
        content: String,
        #[serde(
            rename = "authCommand",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        auth_command: Option<String>,
        #[serde(
            rename = "providerName",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        provider_name: Option<String>,
    },

    /// Response finished
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },

    /// The CLI reported the session id for this conversation
    SessionActive {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        StreamChunk::Text {
            content: content.into(),
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        StreamChunk::Thinking {
            content: content.into(),
        }
    }

    pub fn tool_use(tool_call: ToolCall) -> Self {
        StreamChunk::ToolUse { tool_call }
    }

    pub fn tool_result(tool_call: ToolCall) -> Self {
        StreamChunk::ToolResult { tool_call }
    }

    /// Create a generic error chunk
    pub fn error(content: impl Into<String>) -> Self {
        StreamChunk::Error {
            content: content.into(),
            auth_command: None,
            provider_name: None,
        }
    }

    /// Create an authentication error chunk the consumer can offer re-auth for
    pub fn auth_error(
        content: impl Into<String>,
        auth_command: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        StreamChunk::Error {
            content: content.into(),
            auth_command: Some(auth_command.into()),
            provider_name: Some(provider_name.into()),
        }
    }

    pub fn done(usage: Option<Usage>) -> Self {
        StreamChunk::Done { usage }
    }

    pub fn session_active(session_id: impl Into<String>) -> Self {
        StreamChunk::SessionActive {
            session_id: session_id.into(),
        }
    }

    /// `Done` or `Error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Done { .. } | StreamChunk::Error { .. })
    }

    /// Chunks that count as the provider having produced output
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            StreamChunk::Text { .. }
                | StreamChunk::Thinking { .. }
                | StreamChunk::ToolUse { .. }
                | StreamChunk::ToolResult { .. }
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            StreamChunk::Error {
                auth_command: Some(_),
                ..
            }
        )
    }
}
