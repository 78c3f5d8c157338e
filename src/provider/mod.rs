//! Provider CLI execution and stream normalization.
//!
//! This module drives the locally installed coding CLIs (Claude Code, Codex,
//! Gemini, Copilot) and turns their output into one stream of
//! [`StreamChunk`](crate::StreamChunk)s.
//!
//! # Architecture
//!
//! - **[`ProviderAdapter`]** - the trait every provider implements: discovery,
//!   authentication checks, `send_message` and session control.
//! - **[`CliAdapter`]** - the single process-backed implementation, specialized
//!   per CLI by a [`CliProfile`]:
//!   - [`ClaudeCli`] - `claude --print --output-format stream-json`
//!   - [`CodexCli`] - `codex exec --json`
//!   - [`GeminiCli`] - `gemini --output-format stream-json`
//!   - [`CopilotCli`] - `copilot -p`
//! - **[`StreamParser`]** - per-CLI line parser holding all per-request scratch
//!   state; one value per request.
//! - **[`ChunkStream`]** - what `send_message` returns. A driver task owns the
//!   child process and feeds the stream through a bounded channel.
//! - **[`ProviderRegistry`]** / **[`ProviderManager`]** - adapter lookup and the
//!   default-provider facade.
//!
//! # Request lifecycle
//!
//! spawn, build the prompt while the CLI starts, write it to stdin and close
//! it, then stream stdout until exit. Every stream ends with exactly one
//! `done` or `error` chunk unless it was cancelled. Timeouts and cancellation
//! stop the CLI with SIGTERM, then SIGKILL after `kill_grace_ms`.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use chorus::provider::ProviderManager;
//!
//! let manager = ProviderManager::with_config(&config);
//! let mut stream = manager.send_message(MessageRequest::new("Explain main.rs")).await?;
//! while let Some(chunk) = stream.next().await {
//!     println!("{:?}", chunk);
//! }
//! ```

mod adapter;
mod auth;
mod cli_adapter;
mod discovery;
mod error;
mod line_buffer;
mod manager;
mod parser_util;
mod process;
mod prompt;
mod registry;
mod session;
mod stream;

pub mod claude;
pub mod codex;
pub mod copilot;
pub mod gemini;

pub use adapter::{AuthStatus, CliDiscovery, ProviderAdapter};
pub use auth::is_authentication_error;
pub use claude::{ClaudeAdapter, ClaudeCli};
pub use cli_adapter::{ArgsContext, CliAdapter, CliProfile, PromptDelivery};
pub use codex::{CodexAdapter, CodexCli};
pub use copilot::{CopilotAdapter, CopilotCli};
pub use discovery::find_executable;
pub use error::ProviderError;
pub use gemini::{GeminiAdapter, GeminiCli};
pub use line_buffer::LineBuffer;
pub use manager::{FALLBACK_PROVIDER, ProviderManager, ProviderStatus};
pub use process::{RequestContext, RequestTracker, terminate};
pub use prompt::build_prompt;
pub use registry::ProviderRegistry;
pub use session::SessionSlot;
pub use stream::{CHUNK_CHANNEL_CAPACITY, CancelHandle, ChunkStream, StreamParser};
