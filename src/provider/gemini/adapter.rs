//! Gemini CLI adapter

use crate::config::ProviderConfigToml;
use crate::provider::adapter::AuthStatus;
use crate::provider::cli_adapter::{ArgsContext, CliAdapter, CliProfile};
use crate::provider::discovery::{first_env, home_file, home_json};
use crate::{AccessLevel, ChatMode, ProviderId};

use super::parser::GeminiParser;

/// Gemini adapter (`gemini --output-format stream-json`, prompt on stdin)
pub type GeminiAdapter = CliAdapter<GeminiCli>;

/// Gemini CLI profile
#[derive(Debug, Clone, Default)]
pub struct GeminiCli;

impl GeminiCli {
    fn approval_mode(access: AccessLevel, mode: ChatMode) -> &'static str {
        if access == AccessLevel::ReadOnly || mode == ChatMode::Plan {
            return "default";
        }
        match access {
            AccessLevel::FullAccess => "yolo",
            _ => "auto_edit",
        }
    }
}

impl CliProfile for GeminiCli {
    type Parser = GeminiParser;

    const ID: ProviderId = ProviderId::GoogleGemini;

    fn from_config(_config: &ProviderConfigToml) -> Self {
        GeminiCli
    }

    fn build_args(&self, ctx: &ArgsContext<'_>) -> Vec<String> {
        let mut args: Vec<String> = vec!["--output-format".to_string(), "stream-json".to_string()];

        if let Some(model) = ctx.model {
            args.push("--model".to_string());
            args.push(model.to_string());
        }

        if let Some(session_id) = ctx.session_id {
            args.push("--resume".to_string());
            args.push(session_id.to_string());
        }

        args.push("--approval-mode".to_string());
        args.push(Self::approval_mode(ctx.settings.access_level, ctx.settings.mode).to_string());
        args
    }

    fn new_parser(&self) -> GeminiParser {
        GeminiParser::new()
    }

    fn check_authentication(&self) -> AuthStatus {
        if let Some(var) = first_env(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]) {
            return AuthStatus::authenticated(Some(var.to_string()));
        }

        if home_file(".gemini/oauth_creds.json").is_some() {
            let user = home_json(".gemini/google_accounts.json")
                .and_then(|v| v.get("active").and_then(|a| a.as_str()).map(str::to_string));
            return AuthStatus::authenticated(user);
        }

        AuthStatus::unauthenticated(format!(
            "No Gemini credentials found; run `{}` and sign in",
            ProviderId::GoogleGemini.auth_command()
        ))
    }
}
