//! Brainstorm settings for multi-provider sessions

use serde::{Deserialize, Serialize};

use crate::{AgentConfig, ProviderId};

/// Whether agents review each other before synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionMode {
    /// Individual answers, then synthesis
    #[default]
    Quick,
    /// Individual answers, review rounds, then synthesis
    Full,
}

/// Brainstorm settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainstormSettings {
    /// Agents taking part, in discussion order
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,

    /// Agent that writes the unified answer
    #[serde(default = "default_synthesis_agent")]
    pub synthesis_agent: ProviderId,

    #[serde(default)]
    pub discussion_mode: DiscussionMode,

    /// Review rounds in full mode
    #[serde(default = "default_discussion_rounds")]
    pub discussion_rounds: u32,
}

fn default_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new(ProviderId::ClaudeCode, "Architect").with_instructions(
            "Focus on design, correctness and maintainability. Point out trade-offs explicitly.",
        ),
        AgentConfig::new(ProviderId::OpenaiCodex, "Implementer").with_instructions(
            "Focus on a concrete, working implementation. Prefer specific code over generalities.",
        ),
    ]
}

fn default_synthesis_agent() -> ProviderId {
    ProviderId::ClaudeCode
}

fn default_discussion_rounds() -> u32 {
    1
}

impl Default for BrainstormSettings {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            synthesis_agent: default_synthesis_agent(),
            discussion_mode: DiscussionMode::default(),
            discussion_rounds: default_discussion_rounds(),
        }
    }
}

impl BrainstormSettings {
    /// Rounds that will actually run
    pub fn effective_rounds(&self) -> u32 {
        match self.discussion_mode {
            DiscussionMode::Quick => 0,
            DiscussionMode::Full => self.discussion_rounds,
        }
    }
}
