//! Google Gemini provider

mod adapter;
mod parser;

pub use adapter::{GeminiAdapter, GeminiCli};
pub use parser::GeminiParser;
pub(crate) use parser::FlatEvent;
