//! Chorus - one chat stream for many coding CLIs
//!
//! Chorus drives the locally installed coding assistants (Claude Code, OpenAI
//! Codex, Gemini CLI and GitHub Copilot CLI) as child processes and
//! normalizes their very different output formats into a single stream of
//! [`StreamChunk`]s.
//!
//! ## Layers
//!
//! 1. **Providers** ([`provider`]): CLI discovery, authentication checks,
//!    process lifecycle (prompt delivery, timeout, two-phase kill, session
//!    resume) and one stream parser per CLI.
//!
//! 2. **Brainstorm** ([`brainstorm`]): fans one query out to several
//!    providers concurrently, optionally runs review rounds, then synthesizes
//!    a unified answer.

pub mod brainstorm;
pub mod config;
pub mod domain;
pub mod provider;

pub use domain::*;
