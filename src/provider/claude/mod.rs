//! Claude Code provider
//!
//! Runs `claude --print --output-format stream-json` and translates its
//! partial-message event stream.

mod adapter;
mod parser;

pub use adapter::{ClaudeAdapter, ClaudeCli};
pub use parser::ClaudeParser;
