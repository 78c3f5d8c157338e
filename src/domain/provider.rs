//! Provider identity.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The coding CLIs chorus can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderId {
    /// Anthropic's Claude Code CLI
    #[serde(rename = "claude-code", alias = "claude")]
    ClaudeCode,
    /// OpenAI's Codex CLI
    #[serde(rename = "openai-codex", alias = "codex")]
    OpenaiCodex,
    /// Google's Gemini CLI
    #[serde(rename = "google-gemini", alias = "gemini")]
    GoogleGemini,
    /// GitHub Copilot CLI
    #[serde(rename = "github-copilot", alias = "copilot")]
    GithubCopilot,
}

impl ProviderId {
    /// All built-in providers, in registration order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::ClaudeCode,
        ProviderId::OpenaiCodex,
        ProviderId::GoogleGemini,
        ProviderId::GithubCopilot,
    ];

    /// Stable identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::ClaudeCode => "claude-code",
            ProviderId::OpenaiCodex => "openai-codex",
            ProviderId::GoogleGemini => "google-gemini",
            ProviderId::GithubCopilot => "github-copilot",
        }
    }

    /// Human readable name, also carried in auth error chunks.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::ClaudeCode => "Claude Code",
            ProviderId::OpenaiCodex => "OpenAI Codex",
            ProviderId::GoogleGemini => "Gemini",
            ProviderId::GithubCopilot => "GitHub Copilot",
        }
    }

    /// Executable name looked up on `PATH`.
    pub fn default_binary(&self) -> &'static str {
        match self {
            ProviderId::ClaudeCode => "claude",
            ProviderId::OpenaiCodex => "codex",
            ProviderId::GoogleGemini => "gemini",
            ProviderId::GithubCopilot => "copilot",
        }
    }

    /// Command that installs the CLI.
    pub fn install_command(&self) -> &'static str {
        match self {
            ProviderId::ClaudeCode => "npm install -g @anthropic-ai/claude-code",
            ProviderId::OpenaiCodex => "npm install -g @openai/codex",
            ProviderId::GoogleGemini => "npm install -g @google/gemini-cli",
            ProviderId::GithubCopilot => "npm install -g @github/copilot",
        }
    }

    /// Command the user runs to (re-)authenticate.
    pub fn auth_command(&self) -> &'static str {
        match self {
            ProviderId::ClaudeCode => "claude /login",
            ProviderId::OpenaiCodex => "codex login",
            ProviderId::GoogleGemini => "gemini",
            ProviderId::GithubCopilot => "copilot /login",
        }
    }

    /// Whether the CLI honors a `MAX_THINKING_TOKENS` budget.
    pub fn supports_thinking_budget(&self) -> bool {
        matches!(self, ProviderId::ClaudeCode)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude-code" | "claude" => Ok(ProviderId::ClaudeCode),
            "openai-codex" | "codex" => Ok(ProviderId::OpenaiCodex),
            "google-gemini" | "gemini" => Ok(ProviderId::GoogleGemini),
            "github-copilot" | "copilot" => Ok(ProviderId::GithubCopilot),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}
