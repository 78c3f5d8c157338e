//! Brainstorm session state and stream events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AgentConfig, ProviderId};

/// Brainstorm phases, entered strictly in this order.
/// `Discussion` only runs in full discussion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainstormPhase {
    Initial,
    Individual,
    Discussion,
    Synthesis,
    Complete,
}

impl std::fmt::Display for BrainstormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BrainstormPhase::Initial => "initial",
            BrainstormPhase::Individual => "individual",
            BrainstormPhase::Discussion => "discussion",
            BrainstormPhase::Synthesis => "synthesis",
            BrainstormPhase::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Pending,
    Streaming,
    Complete,
    Error,
}

/// One agent's individual-phase answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: ProviderId,
    pub role: String,
    pub content: String,
    pub thinking: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    pub fn pending(agent: &AgentConfig) -> Self {
        Self {
            agent_id: agent.provider,
            role: agent.role.clone(),
            content: String::new(),
            thinking: String::new(),
            status: AgentStatus::Pending,
            error: None,
        }
    }
}

/// One agent's review in a discussion round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionContribution {
    pub agent_id: ProviderId,
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionRound {
    /// 1-based
    pub round_number: u32,
    pub contributions: Vec<DiscussionContribution>,
}

/// State of one brainstorm; kept until cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainstormSession {
    pub id: String,
    pub query: String,
    pub phase: BrainstormPhase,
    pub agents: Vec<AgentConfig>,
    /// In `agents` order
    pub agent_responses: Vec<AgentResponse>,
    pub discussion_rounds: Vec<DiscussionRound>,
    pub synthesis_agent: ProviderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_solution: Option<String>,
    /// Why synthesis produced no unified solution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BrainstormSession {
    pub fn new(query: impl Into<String>, agents: Vec<AgentConfig>, synthesis_agent: ProviderId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            phase: BrainstormPhase::Initial,
            agent_responses: agents.iter().map(AgentResponse::pending).collect(),
            agents,
            discussion_rounds: Vec::new(),
            synthesis_agent,
            unified_solution: None,
            synthesis_error: None,
            created_at: Utc::now(),
        }
    }

    pub fn response(&self, agent_id: ProviderId) -> Option<&AgentResponse> {
        self.agent_responses.iter().find(|r| r.agent_id == agent_id)
    }

    pub fn response_mut(&mut self, agent_id: ProviderId) -> Option<&mut AgentResponse> {
        self.agent_responses.iter_mut().find(|r| r.agent_id == agent_id)
    }
}

/// Events of a brainstorm stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrainstormStreamChunk {
    PhaseChange {
        phase: BrainstormPhase,
        /// Discussion round being entered
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u32>,
    },
    AgentText {
        #[serde(rename = "agentId")]
        agent_id: ProviderId,
        content: String,
    },
    AgentThinking {
        #[serde(rename = "agentId")]
        agent_id: ProviderId,
        content: String,
    },
    /// An agent failed; without an agent id the whole session was aborted
    AgentError {
        #[serde(rename = "agentId", default, skip_serializing_if = "Option::is_none")]
        agent_id: Option<ProviderId>,
        content: String,
    },
    AgentComplete {
        #[serde(rename = "agentId")]
        agent_id: ProviderId,
    },
    DiscussionText {
        #[serde(rename = "agentId")]
        agent_id: ProviderId,
        round: u32,
        content: String,
    },
    SynthesisText {
        content: String,
    },
    Done {
        #[serde(rename = "unifiedSolution")]
        unified_solution: String,
    },
}

impl BrainstormStreamChunk {
    pub fn phase(phase: BrainstormPhase) -> Self {
        BrainstormStreamChunk::PhaseChange { phase, round: None }
    }

    pub fn discussion_round(round: u32) -> Self {
        BrainstormStreamChunk::PhaseChange {
            phase: BrainstormPhase::Discussion,
            round: Some(round),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tracks_agents_in_order() {
        let agents = vec![
            AgentConfig::new(ProviderId::ClaudeCode, "Architect"),
            AgentConfig::new(ProviderId::OpenaiCodex, "Implementer"),
        ];
        let mut session = BrainstormSession::new("q", agents, ProviderId::ClaudeCode);
        assert_eq!(session.phase, BrainstormPhase::Initial);
        assert_eq!(session.agent_responses.len(), 2);
        assert_eq!(session.agent_responses[1].role, "Implementer");

        session.response_mut(ProviderId::OpenaiCodex).unwrap().content.push_str("x");
        assert_eq!(session.response(ProviderId::OpenaiCodex).unwrap().content, "x");
        assert!(session.response(ProviderId::GoogleGemini).is_none());
    }

    #[test]
    fn chunk_wire_format() {
        let chunk = BrainstormStreamChunk::AgentText {
            agent_id: ProviderId::OpenaiCodex,
            content: "hi".into(),
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            serde_json::json!({"type": "agent_text", "agentId": "openai-codex", "content": "hi"})
        );
        assert_eq!(
            serde_json::to_value(BrainstormStreamChunk::phase(BrainstormPhase::Synthesis)).unwrap(),
            serde_json::json!({"type": "phase_change", "phase": "synthesis"})
        );
    }
}
