//! OpenAI Codex CLI adapter

use crate::config::ProviderConfigToml;
use crate::provider::adapter::AuthStatus;
use crate::provider::cli_adapter::{ArgsContext, CliAdapter, CliProfile};
use crate::provider::discovery::{first_env, home_json};
use crate::{AccessLevel, ChatMode, ProviderId};

use super::parser::CodexParser;

/// Codex adapter (`codex exec --json`, prompt on stdin)
pub type CodexAdapter = CliAdapter<CodexCli>;

/// OpenAI Codex CLI profile
#[derive(Debug, Clone, Default)]
pub struct CodexCli;

impl CliProfile for CodexCli {
    type Parser = CodexParser;

    const ID: ProviderId = ProviderId::OpenaiCodex;

    fn from_config(_config: &ProviderConfigToml) -> Self {
        CodexCli
    }

    fn build_args(&self, ctx: &ArgsContext<'_>) -> Vec<String> {
        // `--ask-for-approval` and `--sandbox` are global flags and must come before `exec`
        let mut args: Vec<String> = Vec::new();

        let read_only = ctx.settings.access_level == AccessLevel::ReadOnly || ctx.settings.mode == ChatMode::Plan;
        if ctx.settings.access_level == AccessLevel::FullAccess && !read_only {
            args.push("--dangerously-bypass-approvals-and-sandbox".to_string());
        } else {
            args.push("--ask-for-approval".to_string());
            args.push("never".to_string());
            args.push("--sandbox".to_string());
            args.push(if read_only { "read-only" } else { "workspace-write" }.to_string());
        }

        args.push("exec".to_string());
        args.push("--json".to_string());
        // allow running outside a git repo
        args.push("--skip-git-repo-check".to_string());

        if let Some(model) = ctx.model {
            args.push("--model".to_string());
            args.push(model.to_string());
        }

        if let Some(effort) = ctx.settings.thinking_level.reasoning_effort() {
            args.push("-c".to_string());
            args.push(format!("model_reasoning_effort={}", effort));
        }

        if let Some(session_id) = ctx.session_id {
            args.push("resume".to_string());
            args.push(session_id.to_string());
        }

        args
    }

    fn trailing_args(&self, _ctx: &ArgsContext<'_>) -> Vec<String> {
        // read the prompt from stdin
        vec!["-".to_string()]
    }

    fn new_parser(&self) -> CodexParser {
        CodexParser::new()
    }

    fn check_authentication(&self) -> AuthStatus {
        if let Some(var) = first_env(&["OPENAI_API_KEY", "CODEX_API_KEY"]) {
            return AuthStatus::authenticated(Some(var.to_string()));
        }

        if let Some(auth) = home_json(".codex/auth.json") {
            let has_key = auth
                .get("OPENAI_API_KEY")
                .and_then(|k| k.as_str())
                .is_some_and(|k| !k.is_empty());
            let has_tokens = auth.get("tokens").is_some_and(|t| !t.is_null());
            if has_key || has_tokens {
                return AuthStatus::authenticated(None);
            }
        }

        AuthStatus::unauthenticated(format!(
            "No Codex credentials found; run `{}`",
            ProviderId::OpenaiCodex.auth_command()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::{ChatSettings, ThinkingLevel};
    use crate::provider::ProviderAdapter;

    fn args(settings: &ChatSettings, session_id: Option<&str>) -> Vec<String> {
        CodexAdapter::from_config(&Config::default()).command_args(settings, session_id, None)
    }

    #[test]
    fn default_args_sandbox_workspace_and_read_stdin() {
        let args = args(&ChatSettings::default(), None);
        let exec = args.iter().position(|a| a == "exec").unwrap();
        let sandbox = args.iter().position(|a| a == "--sandbox").unwrap();
        assert!(sandbox < exec, "global flags precede exec");
        assert_eq!(args[sandbox + 1], "workspace-write");
        assert!(args.contains(&"--json".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("-"));
        assert!(!args.contains(&"resume".to_string()));
    }

    #[test]
    fn resume_and_reasoning_effort() {
        let settings = ChatSettings {
            thinking_level: ThinkingLevel::Ultrathink,
            model: Some("gpt-5-codex".to_string()),
            ..Default::default()
        };
        let args = args(&settings, Some("thread-9"));
        assert!(args.windows(2).any(|w| w == ["resume", "thread-9"]));
        assert!(args.windows(2).any(|w| w == ["-c", "model_reasoning_effort=high"]));
        assert!(args.windows(2).any(|w| w == ["--model", "gpt-5-codex"]));
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }

    #[test]
    fn access_levels() {
        let full = args(
            &ChatSettings {
                access_level: AccessLevel::FullAccess,
                ..Default::default()
            },
            None,
        );
        assert_eq!(full[0], "--dangerously-bypass-approvals-and-sandbox");

        let plan = args(
            &ChatSettings {
                access_level: AccessLevel::FullAccess,
                mode: ChatMode::Plan,
                ..Default::default()
            },
            None,
        );
        assert!(plan.windows(2).any(|w| w == ["--sandbox", "read-only"]));
    }

    #[test]
    fn codex_has_no_thinking_env() {
        let adapter = CodexAdapter::from_config(&Config::default());
        let settings = ChatSettings {
            thinking_level: ThinkingLevel::Think,
            ..Default::default()
        };
        assert!(adapter.command_env(&settings).is_empty());
        assert_eq!(adapter.id(), ProviderId::OpenaiCodex);
    }
}
