//! Request-side types: what a caller hands to a provider adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::ProviderId;

/// How the assistant should treat the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Answer questions, do not modify files
    Ask,
    /// Make the requested edits
    #[default]
    Edit,
    /// Produce a plan only
    Plan,
    /// Work autonomously
    Agent,
}

impl ChatMode {
    /// Instruction appended to the prompt for this mode
    pub fn prompt_suffix(&self) -> Option<&'static str> {
        match self {
            ChatMode::Ask => Some(
                "Answer the question above. Do not modify any files; explain and show code inline instead.",
            ),
            ChatMode::Plan => Some(
                "Produce a step-by-step implementation plan only. Do not modify any files or run commands that change state.",
            ),
            ChatMode::Edit | ChatMode::Agent => None,
        }
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ask" => Ok(ChatMode::Ask),
            "edit" => Ok(ChatMode::Edit),
            "plan" => Ok(ChatMode::Plan),
            "agent" => Ok(ChatMode::Agent),
            other => Err(format!("unknown mode: {} (ask, edit, plan, agent)", other)),
        }
    }
}

/// How much the CLI may do without asking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    /// No writes, no state-changing commands
    ReadOnly,
    /// Edits allowed inside the workspace
    #[default]
    Default,
    /// Bypass approvals and sandboxing
    FullAccess,
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read-only" | "readonly" => Ok(AccessLevel::ReadOnly),
            "default" => Ok(AccessLevel::Default),
            "full-access" | "full" => Ok(AccessLevel::FullAccess),
            other => Err(format!(
                "unknown access level: {} (read-only, default, full-access)",
                other
            )),
        }
    }
}

/// Extended thinking budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThinkingLevel {
    #[default]
    Off,
    Think,
    ThinkHard,
    Ultrathink,
}

impl ThinkingLevel {
    /// Value for `MAX_THINKING_TOKENS`, if any
    pub fn max_thinking_tokens(&self) -> Option<u32> {
        match self {
            ThinkingLevel::Off => None,
            ThinkingLevel::Think => Some(4_000),
            ThinkingLevel::ThinkHard => Some(10_000),
            ThinkingLevel::Ultrathink => Some(31_999),
        }
    }

    /// Codex `model_reasoning_effort` equivalent
    pub fn reasoning_effort(&self) -> Option<&'static str> {
        match self {
            ThinkingLevel::Off => None,
            ThinkingLevel::Think => Some("low"),
            ThinkingLevel::ThinkHard => Some("medium"),
            ThinkingLevel::Ultrathink => Some("high"),
        }
    }
}

impl FromStr for ThinkingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(ThinkingLevel::Off),
            "think" => Ok(ThinkingLevel::Think),
            "think-hard" | "megathink" => Ok(ThinkingLevel::ThinkHard),
            "ultrathink" => Ok(ThinkingLevel::Ultrathink),
            other => Err(format!(
                "unknown thinking level: {} (off, think, think-hard, ultrathink)",
                other
            )),
        }
    }
}

/// Per-request CLI settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub thinking_level: ThinkingLevel,
    /// Model override; falls back to the provider's configured model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Conversation history as the UI layer sees it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

/// A file attached to the request; content is read from disk when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFile {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ContextFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }

    pub fn with_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }
}

/// A user-selected assistant persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub instructions: String,
}

/// Role assignment for a provider taking part in a brainstorm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub provider: ProviderId,
    /// Short role label (e.g., "Architect")
    pub role: String,
    #[serde(default)]
    pub instructions: String,
    /// Extra instructions loaded from disk when the prompt is built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_file: Option<PathBuf>,
}

impl AgentConfig {
    pub fn new(provider: ProviderId, role: impl Into<String>) -> Self {
        Self {
            provider,
            role: role.into(),
            instructions: String::new(),
            instructions_file: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }
}

/// Everything one `send_message` call needs
#[derive(Debug, Clone, Default)]
pub struct MessageRequest {
    /// The user's current message
    pub content: String,
    pub context_files: Vec<ContextFile>,
    pub settings: ChatSettings,
    pub conversation: Conversation,
    pub persona: Option<Persona>,
    /// Chat panel the request belongs to (for log correlation)
    pub panel_id: Option<String>,
    pub agent_config: Option<AgentConfig>,
    /// Working directory for the CLI; defaults to the workspace root
    pub working_dir: Option<PathBuf>,
    /// Resume and latch the adapter's CLI session. Brainstorm runs opt out.
    pub use_session: bool,
}

impl MessageRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            use_session: true,
            ..Default::default()
        }
    }

    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_context_files(mut self, files: Vec<ContextFile>) -> Self {
        self.context_files = files;
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent_config = Some(agent);
        self
    }

    pub fn with_panel(mut self, panel_id: impl Into<String>) -> Self {
        self.panel_id = Some(panel_id.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run without resuming or latching the CLI session
    pub fn without_session(mut self) -> Self {
        self.use_session = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thinking_budgets() {
        assert_eq!(ThinkingLevel::Off.max_thinking_tokens(), None);
        assert_eq!(ThinkingLevel::Ultrathink.max_thinking_tokens(), Some(31_999));
        assert_eq!(ThinkingLevel::ThinkHard.reasoning_effort(), Some("medium"));
    }

    #[test]
    fn new_request_uses_session() {
        let req = MessageRequest::new("hi");
        assert!(req.use_session);
        assert!(!req.without_session().use_session);
    }

    #[test]
    fn mode_suffixes() {
        assert!(ChatMode::Ask.prompt_suffix().is_some());
        assert!(ChatMode::Plan.prompt_suffix().unwrap().contains("plan"));
        assert!(ChatMode::Edit.prompt_suffix().is_none());
    }

    #[test]
    fn parses_cli_values() {
        assert_eq!("plan".parse::<ChatMode>(), Ok(ChatMode::Plan));
        assert_eq!("full".parse::<AccessLevel>(), Ok(AccessLevel::FullAccess));
        assert_eq!("megathink".parse::<ThinkingLevel>(), Ok(ThinkingLevel::ThinkHard));
        assert!("loud".parse::<ChatMode>().is_err());
    }
}
