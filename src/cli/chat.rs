//! Chat command implementation

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::debug;

use chorus::config::Config;
use chorus::provider::{ChunkStream, ProviderManager};
use chorus::{
    AccessLevel, ChatMessage, ChatMode, ChatSettings, ContextFile, Conversation, MessageRequest,
    StreamChunk, ThinkingLevel, ToolStatus,
};

#[derive(Args)]
pub struct ChatArgs {
    /// Provider id or alias (claude, codex, gemini, copilot)
    #[arg(long)]
    provider: Option<String>,

    /// Model override
    #[arg(long)]
    model: Option<String>,

    /// ask, edit, plan or agent
    #[arg(long, default_value = "edit")]
    mode: ChatMode,

    /// read-only, default or full-access
    #[arg(long, default_value = "default")]
    access: AccessLevel,

    /// off, think, think-hard or ultrathink
    #[arg(long, default_value = "off")]
    thinking: ThinkingLevel,

    /// Files to attach as context
    #[arg(long = "context", num_args = 1..)]
    context: Vec<PathBuf>,

    /// Keep the conversation going, one message per line
    #[arg(short, long)]
    interactive: bool,

    /// Print stream chunks as JSON lines
    #[arg(long)]
    json: bool,

    /// Message to send (read from stdin when omitted)
    message: Option<String>,
}

/// Result of rendering one response
struct Reply {
    text: String,
    failed: bool,
}

/// Send one message, or run an interactive session
pub async fn chat_command(work_dir: &Path, config_path: Option<&Path>, args: ChatArgs) -> Result<()> {
    let config = Config::load(work_dir, config_path)?;
    let manager = ProviderManager::with_config(&config);
    if let Some(provider) = &args.provider {
        manager.set_active_provider(provider)?;
    }

    let settings = ChatSettings {
        mode: args.mode,
        access_level: args.access,
        thinking_level: args.thinking,
        model: args.model.clone(),
    };
    let context: Vec<ContextFile> = args.context.iter().map(ContextFile::from_path).collect();

    if !args.interactive {
        let message = match &args.message {
            Some(message) => message.clone(),
            None => read_stdin().await?,
        };
        if message.trim().is_empty() {
            bail!("No message given");
        }
        let request = MessageRequest::new(message)
            .with_settings(settings)
            .with_context_files(context);
        let reply = run_request(&manager, request, args.json).await?;
        manager.dispose();
        if reply.failed {
            bail!("Request failed");
        }
        return Ok(());
    }

    let adapter = manager.active_provider()?;
    eprintln!(
        "Chatting with {}. /clear starts a new session, /exit quits.",
        adapter.display_name()
    );

    let mut conversation = Conversation::new(uuid::Uuid::new_v4().to_string());
    let mut pending = args.message.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let message = match pending.take() {
            Some(message) => message,
            None => {
                eprint!("> ");
                let _ = std::io::stderr().flush();
                match lines.next_line().await? {
                    Some(line) => line,
                    None => break,
                }
            }
        };
        match message.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                manager.clear_session(None);
                conversation = Conversation::new(uuid::Uuid::new_v4().to_string());
                eprintln!("Session cleared.");
                continue;
            }
            _ => {}
        }

        // context files are attached to the first message only
        let files = if conversation.messages.is_empty() {
            context.clone()
        } else {
            Vec::new()
        };
        let request = MessageRequest::new(message.clone())
            .with_settings(settings.clone())
            .with_context_files(files)
            .with_conversation(conversation.clone())
            .with_panel(conversation.id.clone());

        let reply = run_request(&manager, request, args.json).await?;
        conversation.push(ChatMessage::user(message));
        if !reply.failed {
            conversation.push(ChatMessage::assistant(reply.text));
        }
    }

    manager.dispose();
    Ok(())
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read message from stdin")?;
    Ok(input)
}

/// Stream one request to the terminal; Ctrl-C cancels it
async fn run_request(manager: &ProviderManager, request: MessageRequest, json: bool) -> Result<Reply> {
    let mut stream: ChunkStream = manager.send_message(request).await?;
    let mut reply = Reply {
        text: String::new(),
        failed: false,
    };

    loop {
        tokio::select! {
            chunk = stream.next() => {
                let Some(chunk) = chunk else { break };
                if json {
                    println!("{}", serde_json::to_string(&chunk)?);
                } else {
                    render(&chunk);
                }
                match chunk {
                    StreamChunk::Text { content } => reply.text.push_str(&content),
                    StreamChunk::Error { .. } => reply.failed = true,
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                stream.cancel();
                eprintln!("\nCancelled.");
                reply.failed = true;
                // ends once the CLI is stopped
                while stream.next().await.is_some() {}
                break;
            }
        }
    }

    if !json && !reply.text.ends_with('\n') && !reply.text.is_empty() {
        println!();
    }
    Ok(reply)
}

fn render(chunk: &StreamChunk) {
    match chunk {
        StreamChunk::Text { content } => {
            print!("{}", content);
            let _ = std::io::stdout().flush();
        }
        StreamChunk::Thinking { content } => {
            eprint!("\x1b[2m{}\x1b[0m", content);
        }
        StreamChunk::ToolUse { tool_call } => {
            eprintln!("\x1b[36m▸ {}\x1b[0m {}", tool_call.name, summarize_input(&tool_call.input));
        }
        StreamChunk::ToolResult { tool_call } => {
            let mark = if tool_call.status == ToolStatus::Failed { "✗" } else { "✓" };
            eprintln!("\x1b[36m{} {}\x1b[0m", mark, tool_call.name);
        }
        StreamChunk::Error {
            content,
            auth_command,
            ..
        } => {
            eprintln!("\x1b[31merror:\x1b[0m {}", content);
            if let Some(cmd) = auth_command {
                eprintln!("Run `{}` to log in.", cmd);
            }
        }
        StreamChunk::Done { usage } => {
            if let Some(usage) = usage {
                debug!(
                    input = usage.input_tokens,
                    output = usage.output_tokens,
                    "Response finished"
                );
            }
        }
        StreamChunk::SessionActive { session_id } => {
            debug!(session = %session_id, "Session active");
        }
    }
}

/// One-line preview of tool arguments
fn summarize_input(input: &serde_json::Value) -> String {
    let text = match input {
        serde_json::Value::Null => return String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => ["command", "file_path", "path", "pattern", "query"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| input.to_string()),
        other => other.to_string(),
    };
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > 80 {
        format!("{}…", line.chars().take(80).collect::<String>())
    } else {
        line.to_string()
    }
}
