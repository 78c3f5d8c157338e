//! Init command implementation

use anyhow::{Context, Result, bail};
use std::path::Path;

use chorus::config::Config;

/// Default configuration content for chorus init
pub const DEFAULT_CONFIG: &str = r#"# Chorus Configuration
# ====================
#
# Lookup order: --config, .chorus/config.toml in the workspace,
# ~/.chorus/config.toml, then built-in defaults.

# ============================================================================
# SETTINGS
# ============================================================================
#
#   default_provider    - claude-code, openai-codex, google-gemini or github-copilot
#                         (short names claude, codex, gemini, copilot also work)
#   request_timeout_ms  - Wall-clock limit per request; the CLI is killed after it
#   kill_grace_ms       - Time between SIGTERM and SIGKILL when stopping a CLI
#   history_limit       - Trailing conversation messages replayed into the prompt

[settings]
default_provider = "claude-code"
request_timeout_ms = 600000
kill_grace_ms = 3000
history_limit = 10

# ============================================================================
# PROVIDERS - per-CLI overrides
# ============================================================================
#
#   binary      - Executable name or path (default: claude, codex, gemini, copilot)
#   model       - Default model when a request names none
#   env         - Extra environment variables for the CLI process
#   extra_args  - Arguments appended before the prompt
#   json_output - Copilot only: request JSON events instead of terminal text

[provider.claude]
# model = "claude-sonnet-4-5"

[provider.codex]
# model = "gpt-5-codex"

[provider.gemini]
# model = "gemini-2.5-pro"

[provider.copilot]
json_output = false

# ============================================================================
# BRAINSTORM
# ============================================================================
#
#   synthesis_agent   - Provider that writes the unified answer
#   discussion_mode   - "quick" (answers, then synthesis) or "full" (review rounds first)
#   discussion_rounds - Review rounds in full mode

[brainstorm]
synthesis_agent = "claude-code"
discussion_mode = "quick"
discussion_rounds = 1

[[brainstorm.agents]]
provider = "claude-code"
role = "Architect"
instructions = "Focus on design, correctness and maintainability. Point out trade-offs explicitly."

[[brainstorm.agents]]
provider = "openai-codex"
role = "Implementer"
instructions = "Focus on a concrete, working implementation. Prefer specific code over generalities."
"#;

/// Write `.chorus/config.toml` in the workspace
pub async fn init_command(work_dir: &Path, force: bool) -> Result<()> {
    let config_path = Config::workspace_config_path(work_dir);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus::ProviderId;
    use chorus::config::DiscussionMode;

    #[test]
    fn default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.settings.request_timeout_ms, 600_000);
        assert_eq!(config.brainstorm.discussion_mode, DiscussionMode::Quick);
        assert_eq!(config.brainstorm.agents.len(), 2);
        assert_eq!(config.provider_config(ProviderId::GithubCopilot).json_output, false);
    }

    #[tokio::test]
    async fn refuses_to_overwrite_without_force() {
        let dir = tempfile::TempDir::new().unwrap();
        init_command(dir.path(), false).await.unwrap();
        assert!(init_command(dir.path(), false).await.is_err());
        init_command(dir.path(), true).await.unwrap();
        assert!(Config::workspace_config_path(dir.path()).exists());
    }
}
