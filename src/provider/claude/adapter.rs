//! Claude Code CLI adapter

use crate::config::ProviderConfigToml;
use crate::provider::adapter::AuthStatus;
use crate::provider::cli_adapter::{ArgsContext, CliAdapter, CliProfile};
use crate::provider::discovery::{first_env, home_file, home_json};
use crate::{AccessLevel, ChatMode, ProviderId};

use super::parser::ClaudeParser;

/// Claude Code adapter (`claude --print`, prompt on stdin)
pub type ClaudeAdapter = CliAdapter<ClaudeCli>;

/// Claude Code CLI profile
#[derive(Debug, Clone, Default)]
pub struct ClaudeCli;

impl ClaudeCli {
    /// `--permission-mode` / bypass flags for the request
    fn permission_args(access: AccessLevel, mode: ChatMode) -> Vec<String> {
        if access == AccessLevel::ReadOnly || mode == ChatMode::Plan {
            return vec!["--permission-mode".to_string(), "plan".to_string()];
        }
        match access {
            AccessLevel::FullAccess => vec!["--dangerously-skip-permissions".to_string()],
            _ => vec!["--permission-mode".to_string(), "acceptEdits".to_string()],
        }
    }
}

impl CliProfile for ClaudeCli {
    type Parser = ClaudeParser;

    const ID: ProviderId = ProviderId::ClaudeCode;

    fn from_config(_config: &ProviderConfigToml) -> Self {
        ClaudeCli
    }

    fn build_args(&self, ctx: &ArgsContext<'_>) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
            "--include-partial-messages".to_string(),
        ];

        if let Some(session_id) = ctx.session_id {
            args.push("--resume".to_string());
            args.push(session_id.to_string());
        }

        if let Some(model) = ctx.model {
            args.push("--model".to_string());
            args.push(model.to_string());
        }

        args.extend(Self::permission_args(ctx.settings.access_level, ctx.settings.mode));
        args
    }

    fn new_parser(&self) -> ClaudeParser {
        ClaudeParser::new()
    }

    fn check_authentication(&self) -> AuthStatus {
        if let Some(var) = first_env(&["ANTHROPIC_API_KEY"]) {
            return AuthStatus::authenticated(Some(var.to_string()));
        }

        if let Some(account) = home_json(".claude.json").and_then(|v| v.get("oauthAccount").cloned()) {
            let user = account
                .get("emailAddress")
                .and_then(|e| e.as_str())
                .map(str::to_string);
            return AuthStatus::authenticated(user);
        }

        if home_file(".claude/.credentials.json").is_some() {
            return AuthStatus::authenticated(None);
        }

        AuthStatus::unauthenticated(format!(
            "No Claude Code credentials found; run `{}`",
            ProviderId::ClaudeCode.auth_command()
        ))
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
