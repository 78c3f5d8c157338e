//! Provider CLI configuration types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-provider CLI overrides in TOML format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfigToml {
    /// Path or name of the CLI executable. Defaults to the provider's usual binary on `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Default model (e.g., "claude-sonnet-4-5-20250929", "gpt-5-codex")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Extra environment variables for the CLI process
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Extra arguments appended before the prompt
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,

    /// Copilot only: ask for JSON event output instead of terminal text
    #[serde(default)]
    pub json_output: bool,
}
