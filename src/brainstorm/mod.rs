//! Multi-agent brainstorming.
//!
//! A brainstorm sends one query to several providers at once, optionally lets
//! them review each other for a number of rounds, and asks one of them to
//! write a unified answer. Progress is streamed as
//! [`BrainstormStreamChunk`]s.
//!
//! ```rust,ignore
//! let brainstorm = BrainstormManager::new(providers, config.brainstorm.clone());
//! let mut stream = brainstorm.start_brainstorm_session("How should we shard the cache?", vec![]);
//! while let Some(chunk) = stream.next().await {
//!     // render chunk
//! }
//! ```

mod interleave;
mod manager;
mod prompt;
mod types;

pub use interleave::interleave;
pub use manager::{BrainstormManager, BrainstormStream};
pub use prompt::{discussion_prompt, synthesis_prompt};
pub use types::{
    AgentResponse, AgentStatus, BrainstormPhase, BrainstormSession, BrainstormStreamChunk,
    DiscussionContribution, DiscussionRound,
};
