//! Review and synthesis prompts

use std::fmt::Write;

use super::types::{AgentStatus, BrainstormSession, DiscussionContribution};
use crate::ProviderId;

const REVIEW_INSTRUCTIONS: &str = "Review the other analyses critically. State where you agree, \
where you disagree and what is missing, then refine your own position. Be concise.";

const SYNTHESIS_INSTRUCTIONS: &str = "Combine the analyses and the discussion above into one \
unified solution. Resolve disagreements explicitly, keep what the agents agree on, and present \
the final answer directly without restating each agent's view.";

/// Prompt asking `agent_id` to review the others during `round`.
///
/// `current` holds contributions already made earlier in the same round.
pub fn discussion_prompt(
    session: &BrainstormSession,
    agent_id: ProviderId,
    round: u32,
    current: &[DiscussionContribution],
) -> String {
    let mut prompt = header(&session.query);
    analyses(&mut prompt, session, Some(agent_id));
    rounds(&mut prompt, session);

    if !current.is_empty() {
        let _ = writeln!(prompt, "## Round {} so far\n", round);
        for contribution in current {
            let _ = writeln!(prompt, "### {}\n{}\n", contribution.role, contribution.content.trim());
        }
    }

    let _ = write!(prompt, "## Your task (round {})\n{}", round, REVIEW_INSTRUCTIONS);
    prompt
}

/// Prompt asking the synthesis agent for the unified answer
pub fn synthesis_prompt(session: &BrainstormSession) -> String {
    let mut prompt = header(&session.query);
    analyses(&mut prompt, session, None);
    rounds(&mut prompt, session);
    let _ = write!(prompt, "## Your task\n{}", SYNTHESIS_INSTRUCTIONS);
    prompt
}

fn header(query: &str) -> String {
    format!("Several coding agents are brainstorming this question:\n\n{}\n\n", query.trim())
}

fn analyses(prompt: &mut String, session: &BrainstormSession, own: Option<ProviderId>) {
    prompt.push_str("## Individual analyses\n\n");
    for response in &session.agent_responses {
        let label = if Some(response.agent_id) == own {
            format!("{} (you)", response.role)
        } else {
            response.role.clone()
        };
        let body = match response.status {
            AgentStatus::Error if response.content.trim().is_empty() => {
                format!("(no answer: {})", response.error.as_deref().unwrap_or("failed"))
            }
            _ => response.content.trim().to_string(),
        };
        let _ = writeln!(prompt, "### {}\n{}\n", label, body);
    }
}

fn rounds(prompt: &mut String, session: &BrainstormSession) {
    for round in &session.discussion_rounds {
        let _ = writeln!(prompt, "## Discussion round {}\n", round.round_number);
        for contribution in &round.contributions {
            let _ = writeln!(prompt, "### {}\n{}\n", contribution.role, contribution.content.trim());
        }
    }
}
