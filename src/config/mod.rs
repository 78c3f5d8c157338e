//! Configuration loading and management

mod brainstorm;
mod io;
mod provider;
mod settings;

pub use brainstorm::{BrainstormSettings, DiscussionMode};
pub use provider::ProviderConfigToml;
pub use settings::Settings;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ProviderId;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Per-provider CLI overrides, keyed by provider id or alias
    #[serde(default)]
    pub provider: BTreeMap<String, ProviderConfigToml>,

    /// Brainstorm orchestration
    #[serde(default)]
    pub brainstorm: BrainstormSettings,

    /// Workspace root the CLIs run in (set at runtime, not persisted)
    #[serde(skip)]
    pub workspace_root: Option<PathBuf>,
}

impl Config {
    /// Settings for one provider, defaulted when not configured
    pub fn provider_config(&self, id: ProviderId) -> ProviderConfigToml {
        self.provider
            .iter()
            .find(|(key, _)| key.parse::<ProviderId>().ok() == Some(id))
            .map(|(_, cfg)| cfg.clone())
            .unwrap_or_default()
    }

    /// Wall-clock bound for one request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.request_timeout_ms)
    }

    /// Grace period between SIGTERM and SIGKILL
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.settings.kill_grace_ms)
    }

    /// Directory the CLIs are started in when a request names none
    pub fn working_dir(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Attach the workspace root
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_src = r#"
[settings]
default_provider = "openai-codex"
request_timeout_ms = 1000
kill_grace_ms = 50

[provider.claude-code]
binary = "/opt/claude/bin/claude"
model = "claude-sonnet-4-5-20250929"

[provider.copilot]
json_output = true

[brainstorm]
discussion_mode = "full"
discussion_rounds = 2
synthesis_agent = "openai-codex"
"#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.settings.default_provider, "openai-codex");
        assert_eq!(config.request_timeout(), Duration::from_millis(1000));
        assert_eq!(config.kill_grace(), Duration::from_millis(50));

        let claude = config.provider_config(ProviderId::ClaudeCode);
        assert_eq!(claude.binary.as_deref(), Some("/opt/claude/bin/claude"));
        assert!(config.provider_config(ProviderId::GithubCopilot).json_output);
        assert!(config.provider_config(ProviderId::GoogleGemini).binary.is_none());

        assert_eq!(config.brainstorm.discussion_mode, DiscussionMode::Full);
        assert_eq!(config.brainstorm.discussion_rounds, 2);
        assert_eq!(config.brainstorm.synthesis_agent, ProviderId::OpenaiCodex);
        // agents fall back to the built-in pair
        assert_eq!(config.brainstorm.agents.len(), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.settings.default_provider, "claude-code");
        assert_eq!(config.settings.history_limit, 10);
        assert_eq!(config.brainstorm.discussion_mode, DiscussionMode::Quick);
    }
}
