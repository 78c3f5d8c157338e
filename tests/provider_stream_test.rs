//! End-to-end tests driving the adapters against fake CLI scripts

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{chatty_then_idle, collect, fake_cli, fake_cli_emitting, process_alive, text_of};

use chorus::provider::{
    ClaudeAdapter, CodexAdapter, CopilotAdapter, GeminiAdapter, ProviderAdapter,
};
use chorus::{
    AgentConfig, ContextFile, MessageRequest, ProviderId, StreamChunk, ToolStatus, Usage,
};

const CLAUDE_HELLO: &[&str] = &[
    r#"{"type":"system","subtype":"init","session_id":"sess-1","tools":[]}"#,
    r#"{"type":"stream_event","event":{"type":"message_start","message":{"usage":{"input_tokens":12,"output_tokens":1}}}}"#,
    r#"{"type":"stream_event","event":{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}}"#,
    r#"{"type":"stream_event","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hel"}}}"#,
    r#"{"type":"stream_event","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"lo"}}}"#,
    r#"{"type":"stream_event","event":{"type":"content_block_stop","index":0}}"#,
    r#"{"type":"stream_event","event":{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":5}}}"#,
    r#"{"type":"stream_event","event":{"type":"message_stop"}}"#,
    r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Hello"}]}}"#,
    r#"{"type":"result","subtype":"success","is_error":false,"result":"Hello"}"#,
];

#[tokio::test]
async fn claude_streams_text_and_finishes_once() {
    let cli = fake_cli_emitting("claude", CLAUDE_HELLO, 0);
    let adapter = ClaudeAdapter::from_config(&cli.config("claude"));

    let chunks = collect(adapter.send_message(MessageRequest::new("Say hello")).await.unwrap()).await;

    assert_eq!(text_of(&chunks), "Hello");
    assert_eq!(chunks[0], StreamChunk::session_active("sess-1"));
    assert_eq!(chunks.iter().filter(|c| c.is_terminal()).count(), 1);
    match chunks.last() {
        Some(StreamChunk::Done { usage: Some(usage) }) => {
            assert_eq!(usage.input_tokens, 12);
            assert_eq!(usage.output_tokens, 5);
        }
        other => panic!("expected done with usage, got {:?}", other),
    }

    // prompt went through stdin, session latched for the next request
    assert_eq!(cli.recorded_stdin(), "Say hello");
    assert_eq!(adapter.session_id().as_deref(), Some("sess-1"));
    assert!(cli.recorded_args().contains(&"--print".to_string()));
}

#[tokio::test]
async fn claude_resumes_latched_session_unless_disabled() {
    let cli = fake_cli_emitting("claude", CLAUDE_HELLO, 0);
    let adapter = ClaudeAdapter::from_config(&cli.config("claude"));

    collect(adapter.send_message(MessageRequest::new("one")).await.unwrap()).await;
    collect(adapter.send_message(MessageRequest::new("two")).await.unwrap()).await;
    let args = cli.recorded_args();
    let resume = args.iter().position(|a| a == "--resume").expect("--resume passed");
    assert_eq!(args[resume + 1], "sess-1");

    collect(
        adapter
            .send_message(MessageRequest::new("three").without_session())
            .await
            .unwrap(),
    )
    .await;
    assert!(!cli.recorded_args().contains(&"--resume".to_string()));
}

#[tokio::test]
async fn prompt_carries_role_and_context_files() {
    let cli = fake_cli_emitting("claude", CLAUDE_HELLO, 0);
    std::fs::write(cli.dir.path().join("notes.md"), "remember the cache").unwrap();
    let adapter = ClaudeAdapter::from_config(&cli.config("claude"));

    let request = MessageRequest::new("What now?")
        .with_agent(AgentConfig::new(ProviderId::ClaudeCode, "Architect"))
        .with_context_files(vec![ContextFile::from_path("notes.md")]);
    collect(adapter.send_message(request).await.unwrap()).await;

    let prompt = cli.recorded_stdin();
    assert!(prompt.contains("## Role: Architect"));
    assert!(prompt.contains("### notes.md"));
    assert!(prompt.contains("remember the cache"));
    assert!(prompt.contains("## Current message\n\nWhat now?"));
}

#[tokio::test]
async fn codex_deduplicates_command_updates() {
    let cli = fake_cli_emitting(
        "codex",
        &[
            r#"{"type":"thread.started","thread_id":"th-9"}"#,
            r#"{"type":"turn.started"}"#,
            r#"{"type":"item.started","item":{"id":"item_1","type":"command_execution","command":"ls","aggregated_output":"","status":"in_progress"}}"#,
            r#"{"type":"item.updated","item":{"id":"item_1","type":"command_execution","command":"ls","aggregated_output":"a","status":"in_progress"}}"#,
            r#"{"type":"item.updated","item":{"id":"item_1","type":"command_execution","command":"ls","aggregated_output":"a\nb","status":"in_progress"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_1","type":"command_execution","command":"ls","aggregated_output":"a\nb","exit_code":0,"status":"completed"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_2","type":"agent_message","text":"Two files."}}"#,
            r#"{"type":"turn.completed","usage":{"input_tokens":100,"cached_input_tokens":40,"output_tokens":7}}"#,
        ],
        0,
    );
    let adapter = CodexAdapter::from_config(&cli.config("codex"));

    let chunks = collect(adapter.send_message(MessageRequest::new("list")).await.unwrap()).await;

    let uses: Vec<_> = chunks
        .iter()
        .filter(|c| matches!(c, StreamChunk::ToolUse { .. }))
        .collect();
    let results: Vec<_> = chunks
        .iter()
        .filter_map(|c| match c {
            StreamChunk::ToolResult { tool_call } => Some(tool_call),
            _ => None,
        })
        .collect();
    assert_eq!(uses.len(), 1);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ToolStatus::Completed);
    assert_eq!(results[0].output.as_deref(), Some("a\nb"));
    assert_eq!(text_of(&chunks), "Two files.");

    let mut expected = Usage::new(100, 7);
    expected.cache_read_input_tokens = Some(40);
    assert_eq!(chunks.last(), Some(&StreamChunk::done(Some(expected))));

    // stdin marker comes last
    assert_eq!(cli.recorded_args().last().map(String::as_str), Some("-"));
}

#[tokio::test]
async fn gemini_flat_events() {
    let cli = fake_cli_emitting(
        "gemini",
        &[
            r#"{"type":"init","session_id":"g-1","model":"gemini-2.5-pro"}"#,
            r#"{"type":"message","role":"user","content":"hi"}"#,
            r#"{"type":"message","role":"assistant","content":"Hi there","delta":true}"#,
            r#"{"type":"result","status":"success","stats":{"input_tokens":3,"output_tokens":2}}"#,
        ],
        0,
    );
    let adapter = GeminiAdapter::from_config(&cli.config("gemini"));

    let chunks = collect(adapter.send_message(MessageRequest::new("hi")).await.unwrap()).await;
    assert_eq!(text_of(&chunks), "Hi there");
    assert!(matches!(chunks.last(), Some(StreamChunk::Done { .. })));
}

#[tokio::test]
async fn copilot_plain_text_passes_prompt_as_argument() {
    let cli = fake_cli_emitting("copilot", &["Looking at the code", "✓ Read src/main.rs", "Done."], 0);
    let adapter = CopilotAdapter::from_config(&cli.config("copilot"));

    let chunks = collect(adapter.send_message(MessageRequest::new("explain")).await.unwrap()).await;

    let text = text_of(&chunks);
    assert!(text.contains("Looking at the code\n"));
    assert!(text.contains("**✓ Read src/main.rs**"));
    assert!(matches!(chunks.last(), Some(StreamChunk::Done { .. })));

    let args = cli.recorded_args();
    let p = args.iter().position(|a| a == "-p").expect("-p passed");
    assert_eq!(args[p + 1], "explain");
    assert_eq!(cli.recorded_stdin(), "");
}

#[tokio::test]
async fn auth_failure_on_stderr_becomes_auth_error() {
    let cli = fake_cli(
        "claude",
        "echo 'Invalid API key · Please run /login' >&2\nexit 1",
    );
    let adapter = ClaudeAdapter::from_config(&cli.config("claude"));

    let chunks = collect(adapter.send_message(MessageRequest::new("hi")).await.unwrap()).await;

    assert_eq!(chunks.len(), 1);
    match &chunks[0] {
        StreamChunk::Error {
            auth_command,
            provider_name,
            ..
        } => {
            assert_eq!(auth_command.as_deref(), Some("claude /login"));
            assert_eq!(provider_name.as_deref(), Some("Claude Code"));
        }
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn nonzero_exit_reports_stderr() {
    let cli = fake_cli("codex", "echo 'model not supported' >&2\nexit 2");
    let adapter = CodexAdapter::from_config(&cli.config("codex"));

    let chunks = collect(adapter.send_message(MessageRequest::new("hi")).await.unwrap()).await;

    assert_eq!(chunks, vec![StreamChunk::error("model not supported")]);
}

#[tokio::test]
async fn timeout_kills_cli_and_reports_error() {
    let cli = fake_cli("claude", "exec sleep 30");
    let adapter = ClaudeAdapter::from_config(
        &cli.config_with("claude", "request_timeout_ms = 300\nkill_grace_ms = 200"),
    );

    let stream = adapter.send_message(MessageRequest::new("hi")).await.unwrap();
    let pid = stream.pid().expect("pid");
    let chunks = tokio::time::timeout(Duration::from_secs(5), collect(stream))
        .await
        .expect("stream ends after timeout");

    assert_eq!(
        chunks,
        vec![StreamChunk::error("Claude Code request timed out after 300 ms")]
    );
    assert!(!process_alive(pid));
}

#[tokio::test]
async fn cancel_stops_cli_without_terminal_chunk() {
    let cli = fake_cli("claude", "exec sleep 30");
    let adapter = ClaudeAdapter::from_config(&cli.config_with("claude", "kill_grace_ms = 500"));

    let stream = adapter.send_message(MessageRequest::new("hi")).await.unwrap();
    let pid = stream.pid().expect("pid");
    tokio::time::sleep(Duration::from_millis(100)).await;
    adapter.cancel_current_request();

    let chunks = tokio::time::timeout(Duration::from_secs(5), collect(stream))
        .await
        .expect("stream ends after cancel");

    assert!(chunks.iter().all(|c| !c.is_terminal()));
    assert!(!process_alive(pid));
}

#[tokio::test]
async fn cancel_stops_cli_even_when_stream_is_not_read() {
    // more lines than the chunk channel holds
    let cli = fake_cli("claude", &chatty_then_idle(400));
    let adapter = ClaudeAdapter::from_config(&cli.config_with("claude", "kill_grace_ms = 200"));

    let stream = adapter.send_message(MessageRequest::new("hi")).await.unwrap();
    let pid = stream.pid().expect("pid");
    tokio::time::sleep(Duration::from_millis(300)).await;
    stream.cancel();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(!process_alive(pid));
    drop(stream);
}

#[tokio::test]
async fn timeout_fires_even_when_stream_is_not_read() {
    let cli = fake_cli("claude", &chatty_then_idle(400));
    let adapter = ClaudeAdapter::from_config(
        &cli.config_with("claude", "request_timeout_ms = 300\nkill_grace_ms = 200"),
    );

    let stream = adapter.send_message(MessageRequest::new("hi")).await.unwrap();
    let pid = stream.pid().expect("pid");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!process_alive(pid));

    // the timeout error still ends the stream once it is read
    let chunks = tokio::time::timeout(Duration::from_secs(5), collect(stream))
        .await
        .expect("stream ends");
    assert_eq!(
        chunks.last(),
        Some(&StreamChunk::error("Claude Code request timed out after 300 ms"))
    );
}

#[test]
fn runtime_shutdown_kills_running_cli() {
    let cli = fake_cli("claude", "exec sleep 30");
    let adapter = ClaudeAdapter::from_config(&cli.config("claude"));
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let pid = runtime.block_on(async {
        let stream = adapter.send_message(MessageRequest::new("hi")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        stream.pid().expect("pid")
    });
    runtime.shutdown_timeout(Duration::from_secs(1));
    std::thread::sleep(Duration::from_millis(300));

    assert!(!process_alive(pid));
}

#[tokio::test]
async fn missing_binary_fails_before_streaming() {
    let config: chorus::config::Config =
        toml::from_str("[provider.gemini]\nbinary = \"/nonexistent/gemini\"\n").unwrap();
    let adapter = GeminiAdapter::from_config(&config);

    assert!(!adapter.discover_cli().await.found);
    let err = adapter.send_message(MessageRequest::new("hi")).await.err().unwrap();
    assert!(err.to_string().contains("not found"));
}
