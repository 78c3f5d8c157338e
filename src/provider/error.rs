//! Typed failures surfaced by the provider layer.

use std::path::PathBuf;

use crate::ProviderId;

/// Errors that stop a request before any chunk can be streamed
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The id does not name a registered provider
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The CLI executable could not be located
    #[error("{provider} CLI not found; install it with `{install_command}`")]
    CliNotFound {
        provider: ProviderId,
        install_command: String,
    },

    /// The OS refused to start the CLI
    #[error("failed to spawn {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A piped stdio handle was not available after spawn
    #[error("failed to capture {0} pipe")]
    PipeUnavailable(&'static str),
}
