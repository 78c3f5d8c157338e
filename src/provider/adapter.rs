//! Generic provider adapter trait

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use super::stream::ChunkStream;
use crate::{MessageRequest, ProviderId};

/// Result of looking for a provider CLI on this machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CliDiscovery {
    pub found: bool,
    /// Resolved executable path when found
    pub path: Option<PathBuf>,
    /// Shell command that installs the CLI
    pub install_command: Option<String>,
}

impl CliDiscovery {
    pub fn found(path: PathBuf) -> Self {
        Self {
            found: true,
            path: Some(path),
            install_command: None,
        }
    }

    pub fn missing(install_command: impl Into<String>) -> Self {
        Self {
            found: false,
            path: None,
            install_command: Some(install_command.into()),
        }
    }
}

/// Whether the CLI has usable credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    /// Account name or credential source, when known
    pub user: Option<String>,
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn authenticated(user: Option<String>) -> Self {
        Self {
            authenticated: true,
            user,
            error: None,
        }
    }

    pub fn unauthenticated(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            user: None,
            error: Some(error.into()),
        }
    }
}

/// Trait for provider adapters
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    fn display_name(&self) -> &str {
        self.id().display_name()
    }

    /// Locate the CLI executable
    async fn discover_cli(&self) -> CliDiscovery;

    /// Check for stored credentials without running the CLI
    async fn check_authentication(&self) -> AuthStatus;

    /// Command the user runs to log in
    fn auth_command(&self) -> &str {
        self.id().auth_command()
    }

    /// Command the user runs to install the CLI
    fn install_command(&self) -> &str {
        self.id().install_command()
    }

    /// Warm-up hook run once by the registry. Fails when the CLI is unusable.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Start one request and stream its chunks.
    ///
    /// `Err` means the CLI could not be started at all. Everything after a
    /// successful spawn is reported in-band and the stream ends with exactly
    /// one of `done` or `error`, unless it is cancelled.
    async fn send_message(&self, request: MessageRequest) -> Result<ChunkStream>;

    /// Cancel every in-flight request of this adapter
    fn cancel_current_request(&self);

    /// Forget the latched CLI session so the next request starts fresh
    fn clear_session(&self);

    fn has_session(&self) -> bool {
        self.session_id().is_some()
    }

    fn session_id(&self) -> Option<String>;

    /// Release resources; cancels whatever is still running
    fn dispose(&self) {
        self.cancel_current_request();
    }
}
