//! Prompt assembly shared by all CLIs

use std::path::Path;

use tracing::warn;

use crate::{ContextFile, MessageRequest, Role};

/// Build the full prompt text for one request.
///
/// Sections, in order: agent role and instructions, persona, context files,
/// the trailing `history_limit` messages of the conversation, the current
/// message and the mode suffix. Empty sections are left out.
pub async fn build_prompt(request: &MessageRequest, history_limit: usize, working_dir: &Path) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(agent) = &request.agent_config {
        let mut section = format!("## Role: {}\n", agent.role);
        if !agent.instructions.trim().is_empty() {
            section.push('\n');
            section.push_str(agent.instructions.trim());
            section.push('\n');
        }
        if let Some(file) = &agent.instructions_file {
            let path = resolve(working_dir, file);
            match tokio::fs::read_to_string(&path).await {
                Ok(extra) if !extra.trim().is_empty() => {
                    section.push('\n');
                    section.push_str(extra.trim());
                    section.push('\n');
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to read agent instructions {}: {}", path.display(), e),
            }
        }
        sections.push(section);
    }

    if let Some(persona) = &request.persona {
        sections.push(format!(
            "## Persona: {}\n\n{}\n",
            persona.name,
            persona.instructions.trim()
        ));
    }

    if !request.context_files.is_empty() {
        let mut section = String::from("## Context files\n");
        for file in &request.context_files {
            if let Some(formatted) = format_context_file(file, working_dir).await {
                section.push('\n');
                section.push_str(&formatted);
            }
        }
        sections.push(section);
    }

    let history = trailing_history(request, history_limit);
    if !history.is_empty() {
        let mut section = String::from("## Conversation history\n\n");
        for (role, content) in history {
            let label = match role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            section.push_str(&format!("{}: {}\n\n", label, content.trim()));
        }
        sections.push(section.trim_end().to_string() + "\n");
    }

    if sections.is_empty() {
        sections.push(request.content.clone());
    } else {
        sections.push(format!("## Current message\n\n{}\n", request.content));
    }

    if let Some(suffix) = request.settings.mode.prompt_suffix() {
        sections.push(suffix.to_string());
    }

    sections
        .iter()
        .map(|s| s.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The last `limit` history messages, without a trailing copy of the current message
fn trailing_history(request: &MessageRequest, limit: usize) -> Vec<(Role, &str)> {
    let mut messages: &[crate::ChatMessage] = &request.conversation.messages;
    if let Some((last, rest)) = messages.split_last() {
        if last.role == Role::User && last.content == request.content {
            messages = rest;
        }
    }
    let start = messages.len().saturating_sub(limit);
    messages[start..]
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect()
}

async fn format_context_file(file: &ContextFile, working_dir: &Path) -> Option<String> {
    let content = match &file.content {
        Some(content) => content.clone(),
        None => {
            let path = resolve(working_dir, &file.path);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping context file {}: {}", path.display(), e);
                    return None;
                }
            }
        }
    };

    let lang = fence_language(&file.path);
    Some(format!(
        "### {}\n```{}\n{}\n```\n",
        file.path.display(),
        lang,
        content.trim_end()
    ))
}

fn resolve(working_dir: &Path, path: &Path) -> std::path::PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

/// Markdown fence language for a file extension
fn fence_language(path: &Path) -> &str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "swift" => "swift",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "cs" => "csharp",
        "sh" | "bash" | "zsh" => "bash",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        other => other,
    }
}
