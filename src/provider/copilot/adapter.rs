//! GitHub Copilot CLI adapter

use crate::config::ProviderConfigToml;
use crate::provider::adapter::AuthStatus;
use crate::provider::cli_adapter::{ArgsContext, CliAdapter, CliProfile, PromptDelivery};
use crate::provider::discovery::{first_env, home_json};
use crate::{AccessLevel, ChatMode, ProviderId};

use super::parser::CopilotParser;

/// Copilot adapter (`copilot -p <prompt>`)
pub type CopilotAdapter = CliAdapter<CopilotCli>;

/// GitHub Copilot CLI profile
#[derive(Debug, Clone, Default)]
pub struct CopilotCli {
    /// Request `--output-format json` instead of terminal text
    json_output: bool,
}

impl CopilotCli {
    fn tool_permission_args(access: AccessLevel, mode: ChatMode) -> Vec<String> {
        if access == AccessLevel::ReadOnly || mode == ChatMode::Plan {
            return vec![
                "--deny-tool".to_string(),
                "write".to_string(),
                "--deny-tool".to_string(),
                "shell".to_string(),
            ];
        }
        match access {
            AccessLevel::FullAccess => vec!["--allow-all-tools".to_string()],
            _ => vec!["--allow-tool".to_string(), "write".to_string()],
        }
    }
}

impl CliProfile for CopilotCli {
    type Parser = CopilotParser;

    const ID: ProviderId = ProviderId::GithubCopilot;
    const DELIVERY: PromptDelivery = PromptDelivery::Argv;

    fn from_config(config: &ProviderConfigToml) -> Self {
        Self {
            json_output: config.json_output,
        }
    }

    fn build_args(&self, ctx: &ArgsContext<'_>) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        if let Some(model) = ctx.model {
            args.push("--model".to_string());
            args.push(model.to_string());
        }

        if let Some(session_id) = ctx.session_id {
            args.push("--resume".to_string());
            args.push(session_id.to_string());
        }

        args.extend(Self::tool_permission_args(ctx.settings.access_level, ctx.settings.mode));

        if self.json_output {
            args.push("--output-format".to_string());
            args.push("json".to_string());
        }
        args
    }

    fn trailing_args(&self, ctx: &ArgsContext<'_>) -> Vec<String> {
        vec!["-p".to_string(), ctx.prompt.unwrap_or_default().to_string()]
    }

    fn new_parser(&self) -> CopilotParser {
        CopilotParser::new()
    }

    fn check_authentication(&self) -> AuthStatus {
        if let Some(var) = first_env(&["COPILOT_GITHUB_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"]) {
            return AuthStatus::authenticated(Some(var.to_string()));
        }

        let login = home_json(".copilot/config.json").and_then(|config| {
            let users = config.get("logged_in_users")?.as_array()?.clone();
            let first = users.first()?;
            Some(
                first
                    .get("login")
                    .and_then(|l| l.as_str())
                    .map(str::to_string),
            )
        });
        if let Some(user) = login {
            return AuthStatus::authenticated(user);
        }

        AuthStatus::unauthenticated(format!(
            "No GitHub Copilot login found; run `{}`",
            ProviderId::GithubCopilot.auth_command()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatSettings;
    use crate::config::Config;

    #[test]
    fn prompt_travels_in_argv() {
        let adapter = CopilotAdapter::from_config(&Config::default());
        let args = adapter.command_args(&ChatSettings::default(), None, Some("Explain main.rs"));
        assert_eq!(&args[args.len() - 2..], ["-p", "Explain main.rs"]);
        assert!(!args.contains(&"--output-format".to_string()));
        assert!(args.windows(2).any(|w| w == ["--allow-tool", "write"]));
    }

    #[test]
    fn json_output_and_resume() {
        let config: Config = toml::from_str("[provider.github-copilot]\njson_output = true\n").unwrap();
        let adapter = CopilotAdapter::from_config(&config);
        let settings = ChatSettings {
            access_level: AccessLevel::FullAccess,
            ..Default::default()
        };
        let args = adapter.command_args(&settings, Some("cp-3"), Some("hi"));
        assert!(args.windows(2).any(|w| w == ["--output-format", "json"]));
        assert!(args.windows(2).any(|w| w == ["--resume", "cp-3"]));
        assert!(args.contains(&"--allow-all-tools".to_string()));
    }

    #[test]
    fn read_only_denies_writes() {
        let args = CopilotCli::tool_permission_args(AccessLevel::ReadOnly, ChatMode::Edit);
        assert_eq!(args, vec!["--deny-tool", "write", "--deny-tool", "shell"]);
    }
}
