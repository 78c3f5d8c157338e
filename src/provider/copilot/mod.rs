//! GitHub Copilot provider

mod adapter;
mod parser;

pub use adapter::{CopilotAdapter, CopilotCli};
pub use parser::CopilotParser;
