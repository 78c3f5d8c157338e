//! Brainstorm command implementation

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use futures::StreamExt;

use chorus::ProviderId;
use chorus::brainstorm::{BrainstormManager, BrainstormPhase, BrainstormStreamChunk};
use chorus::config::{Config, DiscussionMode};
use chorus::provider::ProviderManager;

/// Run one brainstorm and print its progress
pub async fn brainstorm_command(
    work_dir: &Path,
    config_path: Option<&Path>,
    query: &str,
    full: bool,
    rounds: Option<u32>,
    json: bool,
) -> Result<()> {
    let config = Config::load(work_dir, config_path)?;
    let mut settings = config.brainstorm.clone();
    if full || rounds.is_some() {
        settings.discussion_mode = DiscussionMode::Full;
    }
    if let Some(rounds) = rounds {
        settings.discussion_rounds = rounds;
    }

    let providers = Arc::new(ProviderManager::with_config(&config));
    let brainstorm = BrainstormManager::new(providers.clone(), settings);
    let mut stream = brainstorm.start_brainstorm_session(query, Vec::new());

    let mut printer = Printer::default();
    let mut finished = false;
    loop {
        tokio::select! {
            chunk = stream.next() => {
                let Some(chunk) = chunk else { break };
                if matches!(chunk, BrainstormStreamChunk::Done { .. }) {
                    finished = true;
                }
                if json {
                    println!("{}", serde_json::to_string(&chunk)?);
                } else {
                    printer.render(&chunk);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                brainstorm.cancel();
                eprintln!("\nCancelled.");
                while stream.next().await.is_some() {}
                break;
            }
        }
    }

    providers.dispose();
    if !finished {
        bail!("Brainstorm did not complete");
    }
    Ok(())
}

/// Terminal rendering; prints a header whenever the speaking agent changes
#[derive(Default)]
struct Printer {
    speaker: Option<(ProviderId, Option<u32>)>,
    at_line_start: bool,
}

impl Printer {
    fn render(&mut self, chunk: &BrainstormStreamChunk) {
        match chunk {
            BrainstormStreamChunk::PhaseChange { phase, round } => {
                self.speaker = None;
                match (phase, round) {
                    (BrainstormPhase::Initial, _) => {}
                    (BrainstormPhase::Discussion, Some(round)) => {
                        self.heading(&format!("Discussion round {}", round));
                    }
                    (BrainstormPhase::Complete, _) => self.finish_line(),
                    (phase, _) => self.heading(&capitalize(&phase.to_string())),
                }
            }
            BrainstormStreamChunk::AgentText { agent_id, content } => {
                self.speak(*agent_id, None);
                self.print(content);
            }
            BrainstormStreamChunk::DiscussionText {
                agent_id,
                round,
                content,
            } => {
                self.speak(*agent_id, Some(*round));
                self.print(content);
            }
            BrainstormStreamChunk::SynthesisText { content } => self.print(content),
            BrainstormStreamChunk::AgentThinking { .. } => {}
            BrainstormStreamChunk::AgentError { agent_id, content } => {
                self.finish_line();
                match agent_id {
                    Some(agent) => eprintln!("\x1b[31m{} error:\x1b[0m {}", agent.display_name(), content),
                    None => eprintln!("\x1b[31merror:\x1b[0m {}", content),
                }
            }
            BrainstormStreamChunk::AgentComplete { agent_id } => {
                eprintln!("\x1b[2m{} finished\x1b[0m", agent_id.display_name());
            }
            BrainstormStreamChunk::Done { .. } => self.finish_line(),
        }
    }

    fn heading(&mut self, title: &str) {
        self.finish_line();
        println!("\n\x1b[1m== {} ==\x1b[0m", title);
        self.at_line_start = true;
    }

    fn speak(&mut self, agent: ProviderId, round: Option<u32>) {
        if self.speaker == Some((agent, round)) {
            return;
        }
        self.finish_line();
        println!("\n\x1b[1;36m[{}]\x1b[0m", agent.display_name());
        self.speaker = Some((agent, round));
        self.at_line_start = true;
    }

    fn print(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        print!("{}", content);
        let _ = std::io::stdout().flush();
        self.at_line_start = content.ends_with('\n');
    }

    fn finish_line(&mut self) {
        if !self.at_line_start {
            println!();
            self.at_line_start = true;
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
