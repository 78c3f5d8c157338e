//! Brainstorm orchestration: individual answers, discussion rounds, synthesis

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::interleave::interleave;
use super::prompt::{discussion_prompt, synthesis_prompt};
use super::types::{
    AgentStatus, BrainstormPhase, BrainstormSession, BrainstormStreamChunk, DiscussionContribution,
    DiscussionRound,
};
use crate::config::BrainstormSettings;
use crate::provider::{CancelHandle, ProviderManager};
use crate::{
    AccessLevel, AgentConfig, ChatMode, ChatSettings, ContextFile, MessageRequest, ProviderId,
    StreamChunk,
};

/// Chunk stream of one brainstorm session
pub type BrainstormStream = Pin<Box<dyn Stream<Item = BrainstormStreamChunk> + Send>>;

/// Runs brainstorm sessions over the registered providers.
///
/// Holds at most one session. Starting a new one replaces (and cancels) the
/// previous session.
pub struct BrainstormManager {
    providers: Arc<ProviderManager>,
    settings: BrainstormSettings,
    session: SessionCell,
    run: Mutex<Option<Arc<RunControl>>>,
}

impl BrainstormManager {
    pub fn new(providers: Arc<ProviderManager>, settings: BrainstormSettings) -> Self {
        Self {
            providers,
            settings,
            session: SessionCell::default(),
            run: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &BrainstormSettings {
        &self.settings
    }

    /// Snapshot of the current (or last finished) session
    pub fn session(&self) -> Option<BrainstormSession> {
        self.session.snapshot()
    }

    /// Drop the session; a run still in progress is cancelled
    pub fn clear_session(&self) {
        self.cancel();
        self.session.clear();
    }

    /// Stop the running session. Its stream ends without `done`.
    pub fn cancel(&self) {
        if let Some(run) = self.run.lock().unwrap_or_else(|e| e.into_inner()).take() {
            run.cancel();
        }
    }

    /// Start a brainstorm on `query` and stream its progress.
    ///
    /// Phases run in order: individual answers from every agent concurrently,
    /// then `discussion_rounds` sequential review rounds (full mode only), then
    /// one synthesis request. Failing to start any provider request aborts the
    /// session with a single `agent_error`. A synthesis that reports an error
    /// ends the stream without `done`; the error is kept on the session.
    pub fn start_brainstorm_session(
        &self,
        query: impl Into<String>,
        context: Vec<ContextFile>,
    ) -> BrainstormStream {
        let query = query.into();
        let agents = unique_agents(&self.settings.agents);
        let synthesis_agent = self.settings.synthesis_agent;
        let rounds = self.settings.effective_rounds();

        let control = Arc::new(RunControl::default());
        if let Some(previous) = self
            .run
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(control.clone())
        {
            previous.cancel();
        }

        let session = BrainstormSession::new(query.clone(), agents.clone(), synthesis_agent);
        let id = session.id.clone();
        info!(
            session = %id,
            agents = agents.len(),
            rounds,
            synthesis = %synthesis_agent,
            "Starting brainstorm"
        );
        self.session.replace(session);

        let providers = self.providers.clone();
        let cell = self.session.clone();

        Box::pin(stream! {
            yield BrainstormStreamChunk::phase(BrainstormPhase::Initial);

            cell.update(&id, |s| s.phase = BrainstormPhase::Individual);
            yield BrainstormStreamChunk::phase(BrainstormPhase::Individual);

            let mut streams = Vec::with_capacity(agents.len());
            for agent in &agents {
                let request = agent_request(agent, query.clone(), context.clone());
                match providers.send_message_to_provider(agent.provider, request).await {
                    Ok(stream) => {
                        control.track(stream.cancel_handle());
                        cell.update(&id, |s| {
                            if let Some(r) = s.response_mut(agent.provider) {
                                r.status = AgentStatus::Streaming;
                            }
                        });
                        streams.push((agent.provider, stream));
                    }
                    Err(e) => {
                        for (_, started) in &streams {
                            started.cancel();
                        }
                        yield abort(&cell, &id, Some(agent.provider), e);
                        return;
                    }
                }
            }

            let mut merged = Box::pin(interleave(streams));
            while let Some((agent_id, chunk)) = merged.next().await {
                if let Some(out) = record_individual(&cell, &id, agent_id, chunk) {
                    yield out;
                }
            }
            drop(merged);
            if control.is_cancelled() {
                end_cancelled(&cell, &id);
                return;
            }

            for round in 1..=rounds {
                cell.update(&id, |s| s.phase = BrainstormPhase::Discussion);
                yield BrainstormStreamChunk::discussion_round(round);

                let mut contributions: Vec<DiscussionContribution> = Vec::with_capacity(agents.len());
                for agent in &agents {
                    let Some(snapshot) = cell.snapshot_of(&id) else {
                        return;
                    };
                    let prompt = discussion_prompt(&snapshot, agent.provider, round, &contributions);
                    let request = agent_request(agent, prompt, Vec::new());
                    let mut stream = match providers.send_message_to_provider(agent.provider, request).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            yield abort(&cell, &id, Some(agent.provider), e);
                            return;
                        }
                    };
                    control.track(stream.cancel_handle());

                    let mut text = String::new();
                    while let Some(chunk) = stream.next().await {
                        match chunk {
                            StreamChunk::Text { content } => {
                                text.push_str(&content);
                                yield BrainstormStreamChunk::DiscussionText {
                                    agent_id: agent.provider,
                                    round,
                                    content,
                                };
                            }
                            StreamChunk::Thinking { content } => {
                                yield BrainstormStreamChunk::AgentThinking {
                                    agent_id: agent.provider,
                                    content,
                                };
                            }
                            StreamChunk::Error { content, .. } => {
                                yield BrainstormStreamChunk::AgentError {
                                    agent_id: Some(agent.provider),
                                    content,
                                };
                            }
                            _ => {}
                        }
                    }
                    if control.is_cancelled() {
                        end_cancelled(&cell, &id);
                        return;
                    }

                    contributions.push(DiscussionContribution {
                        agent_id: agent.provider,
                        role: agent.role.clone(),
                        content: text,
                    });
                }

                debug!(session = %id, round, "Discussion round finished");
                cell.update(&id, |s| {
                    s.discussion_rounds.push(DiscussionRound {
                        round_number: round,
                        contributions,
                    })
                });
            }

            cell.update(&id, |s| s.phase = BrainstormPhase::Synthesis);
            yield BrainstormStreamChunk::phase(BrainstormPhase::Synthesis);

            let Some(snapshot) = cell.snapshot_of(&id) else {
                return;
            };
            let synthesizer = agents
                .iter()
                .find(|a| a.provider == synthesis_agent)
                .cloned()
                .unwrap_or_else(|| AgentConfig::new(synthesis_agent, "Synthesizer"));
            let request = agent_request(&synthesizer, synthesis_prompt(&snapshot), Vec::new());
            let mut stream = match providers.send_message_to_provider(synthesis_agent, request).await {
                Ok(stream) => stream,
                Err(e) => {
                    yield abort(&cell, &id, Some(synthesis_agent), e);
                    return;
                }
            };
            control.track(stream.cancel_handle());

            let mut unified = String::new();
            let mut failure = None;
            while let Some(chunk) = stream.next().await {
                match chunk {
                    StreamChunk::Text { content } => {
                        unified.push_str(&content);
                        yield BrainstormStreamChunk::SynthesisText { content };
                    }
                    StreamChunk::Thinking { content } => {
                        yield BrainstormStreamChunk::AgentThinking {
                            agent_id: synthesis_agent,
                            content,
                        };
                    }
                    StreamChunk::Error { content, .. } => {
                        failure = Some(content.clone());
                        yield BrainstormStreamChunk::AgentError {
                            agent_id: Some(synthesis_agent),
                            content,
                        };
                    }
                    _ => {}
                }
            }
            if control.is_cancelled() {
                end_cancelled(&cell, &id);
                return;
            }
            if let Some(error) = failure {
                // partial text is not a unified solution
                warn!(session = %id, "Synthesis failed: {}", error);
                cell.update(&id, |s| {
                    s.synthesis_error = Some(error);
                    s.phase = BrainstormPhase::Complete;
                });
                return;
            }

            cell.update(&id, |s| {
                s.unified_solution = Some(unified.clone());
                s.phase = BrainstormPhase::Complete;
            });
            info!(session = %id, chars = unified.len(), "Brainstorm complete");
            yield BrainstormStreamChunk::phase(BrainstormPhase::Complete);
            yield BrainstormStreamChunk::Done { unified_solution: unified };
        })
    }
}

/// Shared slot for the live session
#[derive(Clone, Default)]
struct SessionCell(Arc<Mutex<Option<BrainstormSession>>>);

impl SessionCell {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<BrainstormSession>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn replace(&self, session: BrainstormSession) {
        *self.lock() = Some(session);
    }

    fn clear(&self) {
        *self.lock() = None;
    }

    fn snapshot(&self) -> Option<BrainstormSession> {
        self.lock().clone()
    }

    /// Snapshot, if `id` is still the live session
    fn snapshot_of(&self, id: &str) -> Option<BrainstormSession> {
        self.lock().as_ref().filter(|s| s.id == id).cloned()
    }

    /// Apply `f` if `id` is still the live session
    fn update<R>(&self, id: &str, f: impl FnOnce(&mut BrainstormSession) -> R) -> Option<R> {
        self.lock().as_mut().filter(|s| s.id == id).map(f)
    }
}

/// Cancellation for one run and the provider requests it started
#[derive(Default)]
struct RunControl {
    token: CancellationToken,
    handles: Mutex<Vec<CancelHandle>>,
}

impl RunControl {
    fn track(&self, handle: CancelHandle) {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        if self.token.is_cancelled() {
            handle.cancel();
        } else {
            handles.push(handle);
        }
    }

    fn cancel(&self) {
        self.token.cancel();
        for handle in self.handles.lock().unwrap_or_else(|e| e.into_inner()).drain(..) {
            handle.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// One agent per provider; later duplicates are dropped
fn unique_agents(agents: &[AgentConfig]) -> Vec<AgentConfig> {
    let mut seen = HashSet::new();
    agents
        .iter()
        .filter(|agent| {
            let fresh = seen.insert(agent.provider);
            if !fresh {
                warn!(provider = %agent.provider, role = %agent.role, "Duplicate brainstorm agent ignored");
            }
            fresh
        })
        .cloned()
        .collect()
}

/// Sessionless, read-only request for one agent
fn agent_request(agent: &AgentConfig, content: String, context: Vec<ContextFile>) -> MessageRequest {
    MessageRequest::new(content)
        .with_settings(ChatSettings {
            mode: ChatMode::Ask,
            access_level: AccessLevel::ReadOnly,
            ..Default::default()
        })
        .with_agent(agent.clone())
        .with_context_files(context)
        .without_session()
}

/// Fold one individual-phase chunk into the session
fn record_individual(
    cell: &SessionCell,
    id: &str,
    agent_id: ProviderId,
    chunk: StreamChunk,
) -> Option<BrainstormStreamChunk> {
    match chunk {
        StreamChunk::Text { content } => {
            cell.update(id, |s| {
                if let Some(r) = s.response_mut(agent_id) {
                    r.content.push_str(&content);
                }
            });
            Some(BrainstormStreamChunk::AgentText { agent_id, content })
        }
        StreamChunk::Thinking { content } => {
            cell.update(id, |s| {
                if let Some(r) = s.response_mut(agent_id) {
                    r.thinking.push_str(&content);
                }
            });
            Some(BrainstormStreamChunk::AgentThinking { agent_id, content })
        }
        StreamChunk::Error { content, .. } => {
            warn!(agent = %agent_id, "Brainstorm agent failed: {}", content);
            cell.update(id, |s| {
                if let Some(r) = s.response_mut(agent_id) {
                    r.status = AgentStatus::Error;
                    r.error = Some(content.clone());
                }
            });
            Some(BrainstormStreamChunk::AgentError {
                agent_id: Some(agent_id),
                content,
            })
        }
        StreamChunk::Done { .. } => {
            cell.update(id, |s| {
                if let Some(r) = s.response_mut(agent_id) {
                    r.status = AgentStatus::Complete;
                }
            });
            Some(BrainstormStreamChunk::AgentComplete { agent_id })
        }
        StreamChunk::ToolUse { .. } | StreamChunk::ToolResult { .. } | StreamChunk::SessionActive { .. } => None,
    }
}

fn abort(
    cell: &SessionCell,
    id: &str,
    agent_id: Option<ProviderId>,
    error: anyhow::Error,
) -> BrainstormStreamChunk {
    let content = format!("Brainstorm aborted: {:#}", error);
    warn!(session = %id, "{}", content);
    cell.update(id, |s| {
        s.phase = BrainstormPhase::Complete;
        if let Some(r) = agent_id.and_then(|agent| s.response_mut(agent)) {
            r.status = AgentStatus::Error;
            r.error = Some(content.clone());
        }
    });
    BrainstormStreamChunk::AgentError { agent_id, content }
}

fn end_cancelled(cell: &SessionCell, id: &str) {
    info!(session = %id, "Brainstorm cancelled");
    cell.update(id, |s| s.phase = BrainstormPhase::Complete);
}
