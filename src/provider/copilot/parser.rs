//! GitHub Copilot CLI output parsing
//!
//! With `--output-format json` Copilot emits the same flat events as Gemini.
//! Without it the output is terminal text, reformatted line by line:
//!
//! - `✓ Read src/main.rs` / `✗ ...` - tool marker, rendered bold
//! - `$ cargo test` - shell command, rendered as a fenced block
//! - `└ 3 files found` - tool result, rendered as a quote

use crate::provider::gemini::{FlatEvent, GeminiParser};
use crate::provider::parser_util::{Line, classify, fallback};
use crate::provider::stream::StreamParser;
use crate::{StreamChunk, Usage};

/// Fold state for one Copilot request; handles both output modes
#[derive(Debug)]
pub struct CopilotParser {
    json: GeminiParser,
}

impl Default for CopilotParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CopilotParser {
    pub fn new() -> Self {
        Self {
            json: GeminiParser::for_provider("GitHub Copilot"),
        }
    }
}

/// Markdown for one line of terminal output
pub(crate) fn format_plain_line(line: &str) -> String {
    let trimmed = line.trim_start();

    if let Some(rest) = trimmed.strip_prefix('✓').or_else(|| trimmed.strip_prefix('✔')) {
        return format!("\n**✓ {}**\n", rest.trim());
    }
    if let Some(rest) = trimmed.strip_prefix('✗').or_else(|| trimmed.strip_prefix('✘')) {
        return format!("\n**✗ {}**\n", rest.trim());
    }
    if let Some(cmd) = trimmed.strip_prefix("$ ") {
        return format!("```bash\n{}\n```\n", cmd.trim_end());
    }
    if let Some(rest) = trimmed.strip_prefix('└') {
        return format!("> {}\n", rest.trim());
    }
    format!("{}\n", line)
}

impl StreamParser for CopilotParser {
    fn parse_line(&mut self, line: &str) -> Vec<StreamChunk> {
        if line.trim().is_empty() {
            // paragraph breaks matter in terminal text
            return vec![StreamChunk::text("\n")];
        }
        match classify::<FlatEvent>(line) {
            Some(Line::Event(event)) => self.json.on_event(event),
            Some(Line::Text(text)) => vec![StreamChunk::text(format_plain_line(&text))],
            Some(other) => fallback(other),
            None => Vec::new(),
        }
    }

    fn take_usage(&mut self) -> Option<Usage> {
        self.json.take_usage()
    }
}
