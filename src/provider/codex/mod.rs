//! OpenAI Codex provider

mod adapter;
mod parser;

pub use adapter::{CodexAdapter, CodexCli};
pub use parser::CodexParser;
