//! Core domain types for chorus

mod provider;
mod request;
mod stream_chunk;

pub use provider::ProviderId;
pub use request::{
    AccessLevel, AgentConfig, ChatMessage, ChatMode, ChatSettings, ContextFile, Conversation,
    MessageRequest, Persona, Role, ThinkingLevel,
};
pub use stream_chunk::{StreamChunk, ToolCall, ToolStatus, Usage};
