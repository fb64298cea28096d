//! Tool-call result rendering
//! Agent tools return arbitrary JSON (the search tool returns a JSON document as a string).
//! Results are classified once into `ToolResult` and each variant has its own summary.

use serde_json::{Map, Number, Value};

const MAX_TEXT_CHARS: usize = 200;
const MAX_OBJECT_KEYS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Number(Number),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Text(String),
    List(Vec<Value>),
    Object(Map<String, Value>),
    Null,
    Primitive(Primitive),
}

impl From<Value> for ToolResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Primitive(Primitive::Bool(b)),
            Value::Number(n) => Self::Primitive(Primitive::Number(n)),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items),
            Value::Object(map) => Self::Object(map),
        }
    }
}

impl ToolResult {
    /// Classify raw tool output. JSON-encoded strings are unwrapped; anything that is not JSON stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return value.into();
            }
        }
        Self::Text(raw.to_string())
    }

    /// One-line human summary. Never fails.
    pub fn summarize(&self) -> String {
        match self {
            Self::Text(text) => summarize_text(text),
            Self::List(items) => summarize_list(items),
            Self::Object(map) => summarize_object(map),
            Self::Null => "no result".to_string(),
            Self::Primitive(Primitive::Bool(b)) => b.to_string(),
            Self::Primitive(Primitive::Number(n)) => n.to_string(),
        }
    }
}

fn summarize_text(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "empty text".to_string();
    }
    truncate(text, MAX_TEXT_CHARS)
}

fn summarize_list(items: &[Value]) -> String {
    match items.len() {
        0 => "empty list".to_string(),
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    }
}

fn summarize_object(map: &Map<String, Value>) -> String {
    if let Some(error) = map.get("error").filter(|v| !v.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return format!("error: {}", truncate(&message, MAX_TEXT_CHARS));
    }

    if let Some(Value::Array(documents)) = map.get("documents") {
        let noun = if documents.len() == 1 { "document" } else { "documents" };
        let mut summary = format!("{} {}", documents.len(), noun);
        if let Some(Value::String(query)) = map.get("query") {
            summary.push_str(&format!(" for \"{}\"", truncate(query, 80)));
        }
        if let Some(Value::String(category)) = map.get("category") {
            summary.push_str(&format!(" in {}", category));
        }
        return summary;
    }

    if map.is_empty() {
        return "empty object".to_string();
    }

    let keys: Vec<&str> = map.keys().take(MAX_OBJECT_KEYS).map(String::as_str).collect();
    let more = map.len().saturating_sub(MAX_OBJECT_KEYS);
    if more > 0 {
        format!("{{{}, +{} more}}", keys.join(", "), more)
    } else {
        format!("{{{}}}", keys.join(", "))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_payload_as_string_is_unwrapped() {
        let raw = json!({
            "query": "swing speed",
            "category": "golf",
            "documents": [{"id": "1"}, {"id": "2"}]
        })
        .to_string();
        let result = ToolResult::parse(&raw);
        assert!(matches!(result, ToolResult::Object(_)));
        assert_eq!(result.summarize(), "2 documents for \"swing speed\" in golf");
    }

    #[test]
    fn search_error_payload() {
        let raw = r#"{"query":"x","category":null,"error":"index unavailable","documents":[]}"#;
        assert_eq!(ToolResult::parse(raw).summarize(), "error: index unavailable");
    }

    #[test]
    fn plain_text_stays_text() {
        let result = ToolResult::parse("  just words  ");
        assert_eq!(result, ToolResult::Text("  just words  ".to_string()));
        assert_eq!(result.summarize(), "just words");
    }

    #[test]
    fn broken_json_falls_back_to_text() {
        let result = ToolResult::parse("{\"documents\": [");
        assert!(matches!(result, ToolResult::Text(_)));
        assert_eq!(result.summarize(), "{\"documents\": [");
    }

    #[test]
    fn long_text_is_truncated_on_char_boundary() {
        let text = "é".repeat(250);
        let summary = ToolResult::Text(text).summarize();
        assert_eq!(summary.chars().count(), MAX_TEXT_CHARS + 1);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn every_variant_has_a_summary() {
        assert_eq!(ToolResult::from(Value::Null).summarize(), "no result");
        assert_eq!(ToolResult::from(json!(true)).summarize(), "true");
        assert_eq!(ToolResult::from(json!(4.5)).summarize(), "4.5");
        assert_eq!(ToolResult::from(json!([])).summarize(), "empty list");
        assert_eq!(ToolResult::from(json!([1])).summarize(), "1 item");
        assert_eq!(ToolResult::from(json!([1, 2, 3])).summarize(), "3 items");
        assert_eq!(ToolResult::from(json!({})).summarize(), "empty object");
        assert_eq!(ToolResult::from(json!({"a": 1, "b": 2})).summarize(), "{a, b}");
        assert_eq!(
            ToolResult::from(json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5})).summarize(),
            "{a, b, c, +2 more}"
        );
    }
}
