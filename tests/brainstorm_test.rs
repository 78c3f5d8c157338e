//! Brainstorm sessions over fake Claude and Codex CLIs

#![cfg(unix)]

mod common;

use std::sync::Arc;

use common::{FakeCli, fake_cli, fake_cli_emitting};
use futures::StreamExt;

use chorus::brainstorm::{BrainstormManager, BrainstormPhase, BrainstormStreamChunk};
use chorus::config::Config;
use chorus::provider::ProviderManager;
use chorus::ProviderId;

fn claude_cli(text: &str) -> FakeCli {
    let delta = format!(
        r#"{{"type":"stream_event","event":{{"type":"content_block_delta","index":0,"delta":{{"type":"text_delta","text":"{}"}}}}}}"#,
        text
    );
    fake_cli_emitting(
        "claude",
        &[
            r#"{"type":"stream_event","event":{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}}"#,
            &delta,
            r#"{"type":"stream_event","event":{"type":"content_block_stop","index":0}}"#,
            r#"{"type":"result","subtype":"success","is_error":false,"result":"ok"}"#,
        ],
        0,
    )
}

fn codex_cli(text: &str) -> FakeCli {
    let message = format!(
        r#"{{"type":"item.completed","item":{{"id":"item_0","type":"agent_message","text":"{}"}}}}"#,
        text
    );
    fake_cli_emitting(
        "codex",
        &[
            r#"{"type":"thread.started","thread_id":"th-1"}"#,
            &message,
            r#"{"type":"turn.completed","usage":{"input_tokens":1,"output_tokens":1}}"#,
        ],
        0,
    )
}

fn config(claude: &FakeCli, codex: &FakeCli, brainstorm: &str) -> Config {
    let toml = format!(
        "[provider.claude]\nbinary = \"{}\"\n[provider.codex]\nbinary = \"{}\"\n[brainstorm]\n{}\n",
        claude.binary.display(),
        codex.binary.display(),
        brainstorm
    );
    let config: Config = toml::from_str(&toml).unwrap();
    config.with_workspace_root(claude.dir.path())
}

async fn run(config: &Config, query: &str) -> (BrainstormManager, Vec<BrainstormStreamChunk>) {
    let providers = Arc::new(ProviderManager::with_config(config));
    let brainstorm = BrainstormManager::new(providers, config.brainstorm.clone());
    let chunks = brainstorm.start_brainstorm_session(query, Vec::new()).collect().await;
    (brainstorm, chunks)
}

#[tokio::test]
async fn quick_mode_never_discusses() {
    let claude = claude_cli("claude view");
    let codex = codex_cli("codex view");
    let config = config(&claude, &codex, "discussion_mode = \"quick\"\ndiscussion_rounds = 3");

    let (brainstorm, chunks) = run(&config, "How do we shard?").await;

    assert!(!chunks
        .iter()
        .any(|c| matches!(c, BrainstormStreamChunk::DiscussionText { .. })));
    assert!(chunks.contains(&BrainstormStreamChunk::AgentText {
        agent_id: ProviderId::OpenaiCodex,
        content: "codex view".into(),
    }));
    assert_eq!(
        chunks.last(),
        Some(&BrainstormStreamChunk::Done {
            unified_solution: "claude view".into()
        })
    );

    let session = brainstorm.session().unwrap();
    assert_eq!(session.phase, BrainstormPhase::Complete);
    assert!(session.discussion_rounds.is_empty());

    // brainstorm requests never resume a CLI session
    assert!(!codex.recorded_args().contains(&"resume".to_string()));
    assert!(!claude.recorded_args().contains(&"--resume".to_string()));
    assert!(claude.recorded_stdin().contains("codex view"));
}

#[tokio::test]
async fn full_mode_runs_each_round() {
    let claude = claude_cli("claude view");
    let codex = codex_cli("codex view");
    let config = config(&claude, &codex, "discussion_mode = \"full\"\ndiscussion_rounds = 2");

    let (brainstorm, chunks) = run(&config, "How do we shard?").await;

    let discussion = chunks
        .iter()
        .filter(|c| matches!(c, BrainstormStreamChunk::DiscussionText { .. }))
        .count();
    assert_eq!(discussion, 4);
    assert_eq!(brainstorm.session().unwrap().discussion_rounds.len(), 2);
    assert!(matches!(chunks.last(), Some(BrainstormStreamChunk::Done { .. })));
}

#[tokio::test]
async fn failing_agent_is_reported_and_synthesis_still_runs() {
    let claude = claude_cli("claude view");
    let codex = fake_cli("codex", "echo 'stream disconnected' >&2\nexit 1");
    let config = config(&claude, &codex, "");

    let (brainstorm, chunks) = run(&config, "q").await;

    assert!(chunks.contains(&BrainstormStreamChunk::AgentError {
        agent_id: Some(ProviderId::OpenaiCodex),
        content: "stream disconnected".into(),
    }));
    assert!(matches!(chunks.last(), Some(BrainstormStreamChunk::Done { .. })));
    assert!(claude.recorded_stdin().contains("(no answer: stream disconnected)"));
    let session = brainstorm.session().unwrap();
    assert_eq!(
        session.response(ProviderId::OpenaiCodex).unwrap().status,
        chorus::brainstorm::AgentStatus::Error
    );
}

#[tokio::test]
async fn missing_cli_aborts_session() {
    let claude = claude_cli("claude view");
    let toml = format!(
        "[provider.claude]\nbinary = \"{}\"\n[provider.codex]\nbinary = \"/nonexistent/codex\"\n",
        claude.binary.display()
    );
    let config: Config = toml::from_str(&toml).unwrap();

    let (brainstorm, chunks) = run(&config, "q").await;

    match chunks.last() {
        Some(BrainstormStreamChunk::AgentError { agent_id, content }) => {
            assert_eq!(*agent_id, Some(ProviderId::OpenaiCodex));
            assert!(content.contains("not found"));
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert!(!chunks.iter().any(|c| matches!(c, BrainstormStreamChunk::Done { .. })));
    assert_eq!(brainstorm.session().unwrap().phase, BrainstormPhase::Complete);
}
