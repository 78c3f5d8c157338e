//! CLI command implementations

pub mod brainstorm;
pub mod chat;
pub mod init;
pub mod providers;
