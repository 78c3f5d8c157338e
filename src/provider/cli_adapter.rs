//! The process-backed adapter shared by every provider CLI.
//!
//! A [`CliProfile`] describes what differs between CLIs: arguments, how the
//! prompt is delivered, where credentials live and which [`StreamParser`]
//! reads the output. [`CliAdapter`] owns everything else: discovery, the
//! session latch, the in-flight request table and the spawn/stream lifecycle.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::adapter::{AuthStatus, CliDiscovery, ProviderAdapter};
use super::discovery::find_executable;
use super::error::ProviderError;
use super::process::RequestTracker;
use super::prompt::build_prompt;
use super::session::SessionSlot;
use super::stream::{CHUNK_CHANNEL_CAPACITY, ChunkStream, DriveOptions, StreamParser, drive};
use crate::config::{Config, ProviderConfigToml};
use crate::{ChatSettings, MessageRequest, ProviderId};

/// How the prompt reaches the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDelivery {
    /// Written to stdin, which is then closed
    Stdin,
    /// Passed as a command-line argument; stdin stays closed
    Argv,
}

/// Inputs for building a CLI argument list
#[derive(Debug, Clone, Copy)]
pub struct ArgsContext<'a> {
    pub settings: &'a ChatSettings,
    /// Request model, else the configured one
    pub model: Option<&'a str>,
    /// Session to resume
    pub session_id: Option<&'a str>,
    /// The prompt, for [`PromptDelivery::Argv`] profiles
    pub prompt: Option<&'a str>,
}

/// What distinguishes one provider CLI from another
pub trait CliProfile: Send + Sync + 'static {
    type Parser: StreamParser;

    const ID: ProviderId;
    const DELIVERY: PromptDelivery = PromptDelivery::Stdin;

    fn from_config(config: &ProviderConfigToml) -> Self
    where
        Self: Sized;

    /// Flags for one run. `[provider] extra_args` are appended after these.
    fn build_args(&self, ctx: &ArgsContext<'_>) -> Vec<String>;

    /// Arguments that must come last (stdin marker, inline prompt)
    fn trailing_args(&self, _ctx: &ArgsContext<'_>) -> Vec<String> {
        Vec::new()
    }

    fn new_parser(&self) -> Self::Parser;

    /// Look for stored credentials
    fn check_authentication(&self) -> AuthStatus;
}

/// Adapter for one provider CLI
pub struct CliAdapter<P: CliProfile> {
    profile: P,
    config: ProviderConfigToml,
    working_dir: PathBuf,
    timeout: Duration,
    grace: Duration,
    history_limit: usize,
    session: Arc<SessionSlot>,
    tracker: Arc<RequestTracker>,
}

impl<P: CliProfile> CliAdapter<P> {
    pub fn from_config(config: &Config) -> Self {
        let provider_config = config.provider_config(P::ID);
        Self {
            profile: P::from_config(&provider_config),
            config: provider_config,
            working_dir: config.working_dir(),
            timeout: config.request_timeout(),
            grace: config.kill_grace(),
            history_limit: config.settings.history_limit,
            session: Arc::new(SessionSlot::new()),
            tracker: Arc::new(RequestTracker::new()),
        }
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Complete argument list for a request
    pub fn command_args(&self, settings: &ChatSettings, session_id: Option<&str>, prompt: Option<&str>) -> Vec<String> {
        let model = settings.model.as_deref().or(self.config.model.as_deref());
        let ctx = ArgsContext {
            settings,
            model,
            session_id,
            prompt,
        };
        let mut args = self.profile.build_args(&ctx);
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(self.profile.trailing_args(&ctx));
        args
    }

    /// Environment added on top of the inherited one
    pub fn command_env(&self, settings: &ChatSettings) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = self
            .config
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if P::ID.supports_thinking_budget() {
            if let Some(tokens) = settings.thinking_level.max_thinking_tokens() {
                env.push(("MAX_THINKING_TOKENS".to_string(), tokens.to_string()));
            }
        }
        env
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        find_executable(P::ID.default_binary(), self.config.binary.as_deref())
    }
}

#[async_trait]
impl<P: CliProfile> ProviderAdapter for CliAdapter<P> {
    fn id(&self) -> ProviderId {
        P::ID
    }

    async fn discover_cli(&self) -> CliDiscovery {
        match self.resolve_binary() {
            Some(path) => CliDiscovery::found(path),
            None => CliDiscovery::missing(P::ID.install_command()),
        }
    }

    async fn check_authentication(&self) -> AuthStatus {
        self.profile.check_authentication()
    }

    async fn initialize(&self) -> Result<()> {
        let path = self.resolve_binary().ok_or_else(|| ProviderError::CliNotFound {
            provider: P::ID,
            install_command: P::ID.install_command().to_string(),
        })?;
        info!(provider = %P::ID, path = %path.display(), "CLI found");
        Ok(())
    }

    async fn send_message(&self, request: MessageRequest) -> Result<ChunkStream> {
        let binary = self.resolve_binary().ok_or_else(|| ProviderError::CliNotFound {
            provider: P::ID,
            install_command: P::ID.install_command().to_string(),
        })?;

        let session_id = if request.use_session {
            self.session.get()
        } else {
            None
        };
        let working_dir = request
            .working_dir
            .clone()
            .unwrap_or_else(|| self.working_dir.clone());

        // Argv delivery needs the prompt before spawn; stdin delivery builds it while the CLI starts
        let inline_prompt = match P::DELIVERY {
            PromptDelivery::Argv => Some(build_prompt(&request, self.history_limit, &working_dir).await),
            PromptDelivery::Stdin => None,
        };

        let args = self.command_args(&request.settings, session_id.as_deref(), inline_prompt.as_deref());
        let stdin = match P::DELIVERY {
            PromptDelivery::Stdin => Stdio::piped(),
            PromptDelivery::Argv => Stdio::null(),
        };

        let mut child = Command::new(&binary)
            .args(&args)
            .current_dir(&working_dir)
            .envs(self.command_env(&request.settings))
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // runtime shutdown drops the driver before it can terminate the CLI
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProviderError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        let pid = child.id();
        info!(
            provider = %P::ID,
            ?pid,
            resume = session_id.is_some(),
            "Spawned {}",
            binary.display()
        );
        debug!(provider = %P::ID, ?args, "CLI arguments");

        if P::DELIVERY == PromptDelivery::Stdin {
            let Some(mut stdin) = child.stdin.take() else {
                let _ = child.start_kill();
                return Err(ProviderError::PipeUnavailable("stdin").into());
            };
            let history_limit = self.history_limit;
            let request = request.clone();
            let working_dir = working_dir.clone();
            tokio::spawn(async move {
                let prompt = build_prompt(&request, history_limit, &working_dir).await;
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    // the CLI exited early; its exit status tells the story
                    debug!(provider = %P::ID, "Failed to write prompt: {}", e);
                }
                let _ = stdin.shutdown().await;
            });
        }

        let ctx = self.tracker.begin(request.panel_id.clone());
        self.tracker.set_pid(ctx.request_id, pid);
        let cancel = ctx.cancel.clone();

        let opts = DriveOptions {
            provider: P::ID,
            timeout: self.timeout,
            grace: self.grace,
            session: request.use_session.then(|| self.session.clone()),
            tracker: self.tracker.clone(),
        };
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        tokio::spawn(drive(child, self.profile.new_parser(), ctx, opts, tx));

        Ok(ChunkStream::new(rx, cancel.into(), pid))
    }

    fn cancel_current_request(&self) {
        let cancelled = self.tracker.cancel_all();
        if cancelled > 0 {
            info!(provider = %P::ID, cancelled, "Cancelled in-flight requests");
        }
    }

    fn clear_session(&self) {
        self.session.clear();
    }

    fn session_id(&self) -> Option<String> {
        self.session.get()
    }
}

impl<P: CliProfile> CliAdapter<P> {
    /// Cancel the requests started for one chat panel
    pub fn cancel_panel(&self, panel_id: &str) -> bool {
        self.tracker.cancel_panel(panel_id)
    }

    /// Number of requests still streaming
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }
}
