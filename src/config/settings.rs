//! Settings configuration types

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider used when a request names none.
    /// Kept as a string: an unknown value falls back to claude-code at send time.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Wall-clock limit for one request, in milliseconds.
    /// A CLI that is still thinking when this expires is killed.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Time between SIGTERM and SIGKILL when stopping a CLI
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// How many trailing conversation messages are replayed into the prompt
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_provider() -> String {
    "claude-code".to_string()
}

fn default_request_timeout_ms() -> u64 {
    600_000
}

fn default_kill_grace_ms() -> u64 {
    3_000
}

fn default_history_limit() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            request_timeout_ms: default_request_timeout_ms(),
            kill_grace_ms: default_kill_grace_ms(),
            history_limit: default_history_limit(),
        }
    }
}
