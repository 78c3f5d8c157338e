//! Fallbacks shared by the per-CLI stream parsers.
//!
//! CLI output formats change without notice, so nothing a parser fails to
//! recognise is dropped: unknown JSON events surface their text fields and
//! non-JSON lines pass through as text.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::StreamChunk;

/// One stdout line after a first classification pass
pub(crate) enum Line<T> {
    /// A known event of the CLI's protocol
    Event(T),
    /// Valid JSON the protocol enum does not cover
    Unknown(Value),
    /// Not JSON at all
    Text(String),
}

/// Classify a line against the CLI's event enum. Blank lines yield `None`.
pub(crate) fn classify<T: DeserializeOwned>(line: &str) -> Option<Line<T>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value @ Value::Object(_)) => value,
        // bare numbers and strings are output text too
        _ => return Some(Line::Text(line.to_string())),
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(event) => Some(Line::Event(event)),
        Err(_) => Some(Line::Unknown(value)),
    }
}

/// Text carried by an unrecognised event, if any
pub(crate) fn fallback_text(value: &Value) -> Option<String> {
    ["content", "text", "message"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|field| match field {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Object(_) => fallback_text(field),
            _ => None,
        })
}

/// Chunk for an unrecognised line
pub(crate) fn fallback<T>(line: Line<T>) -> Vec<StreamChunk> {
    match line {
        Line::Event(_) => Vec::new(),
        Line::Unknown(value) => fallback_text(&value)
            .map(|text| vec![retag_thinking(&text)])
            .unwrap_or_default(),
        Line::Text(text) => vec![StreamChunk::text(format!("{}\n", text))],
    }
}

/// Text wholly wrapped in `**...**` is reasoning some CLIs do not tag
pub(crate) fn retag_thinking(text: &str) -> StreamChunk {
    match unwrap_bold(text) {
        Some(inner) => StreamChunk::thinking(inner),
        None => StreamChunk::text(text),
    }
}

fn unwrap_bold(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix("**")?.strip_suffix("**")?;
    if inner.trim().is_empty() || inner.contains("**") {
        return None;
    }
    Some(inner.trim())
}

/// Compact single-line rendering of a JSON value for tool output
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => value_to_text(item),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Probe {
        Ping,
    }

    #[test]
    fn classifies_lines() {
        assert!(classify::<Probe>("   ").is_none());
        assert!(matches!(classify::<Probe>(r#"{"type":"ping"}"#), Some(Line::Event(Probe::Ping))));
        assert!(matches!(classify::<Probe>(r#"{"type":"pong"}"#), Some(Line::Unknown(_))));
        assert!(matches!(classify::<Probe>("Loading..."), Some(Line::Text(_))));
    }

    #[test]
    fn unknown_events_surface_text() {
        let chunks = fallback::<Probe>(Line::Unknown(json!({"type": "notice", "message": "rate limited"})));
        assert_eq!(chunks, vec![StreamChunk::text("rate limited")]);

        let nested = json!({"type": "x", "message": {"content": "inner"}});
        assert_eq!(fallback_text(&nested).as_deref(), Some("inner"));

        let silent = fallback::<Probe>(Line::Unknown(json!({"type": "heartbeat"})));
        assert!(silent.is_empty());
    }

    #[test]
    fn non_json_passes_through() {
        let chunks = fallback::<Probe>(Line::Text("plain output".into()));
        assert_eq!(chunks, vec![StreamChunk::text("plain output\n")]);
    }

    #[test]
    fn bold_wrapped_text_becomes_thinking() {
        assert_eq!(
            retag_thinking("**Inspecting the parser**"),
            StreamChunk::thinking("Inspecting the parser")
        );
        assert_eq!(retag_thinking("**a** and **b**"), StreamChunk::text("**a** and **b**"));
        assert_eq!(retag_thinking("plain"), StreamChunk::text("plain"));
    }

    #[test]
    fn tool_output_rendering() {
        assert_eq!(value_to_text(&json!("ok")), "ok");
        assert_eq!(
            value_to_text(&json!([{"type": "text", "text": "a"}, {"type": "text", "text": "b"}])),
            "a\nb"
        );
        assert_eq!(value_to_text(&json!({"n": 1})), r#"{"n":1}"#);
    }
}
