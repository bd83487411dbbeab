//! Tool-call extraction from free-form model output
//!
//! Models are asked to emit a fenced JSON action block, but they often
//! skip the fence or surround the call with unrelated JSON and prose. We
//! collect fenced blocks first, then every top-level balanced `{...}` span,
//! and take the first candidate that parses into a valid call.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n?(.*?)```").unwrap());

/// A single `{tool, args}` intent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentToolCall {
    /// Lowercased and trimmed
    pub tool: String,
    pub args: Map<String, Value>,
}

/// Extract the first valid tool call, or `None` if the text holds none.
pub fn parse_tool_call(model_output: &str) -> Option<AgentToolCall> {
    let candidates = collect_candidates(model_output);
    tracing::debug!(candidates = candidates.len(), "Scanning for tool call");
    candidates.iter().find_map(|candidate| {
        serde_json::from_str::<Value>(candidate)
            .ok()
            .and_then(normalize)
    })
}

/// Fenced block bodies, then balanced brace spans, deduplicated by trimmed text
fn collect_candidates(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() && !candidates.iter().any(|c| c == trimmed) {
            candidates.push(trimmed.to_string());
        }
    };

    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(body) = caps.get(1) {
            push(body.as_str());
        }
    }
    for span in balanced_spans(text) {
        push(span);
    }
    candidates
}

/// Every top-level `{...}` span; braces inside string literals are ignored.
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            // Quotes only open strings inside an object; prose quotes are ignored
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = index;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=index]);
                }
            }
            _ => {}
        }
    }
    spans
}

fn normalize(value: Value) -> Option<AgentToolCall> {
    let Value::Object(mut object) = value else {
        return None;
    };
    let tool = object
        .get("tool")
        .and_then(Value::as_str)
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())?;
    let args = match object.remove("args") {
        Some(Value::Object(args)) => args,
        _ => Map::new(),
    };
    Some(AgentToolCall { tool, args })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_block() {
        let text = "Thought: read it\n```json\n{\"tool\": \"read\", \"args\": {\"filePath\": \"a.rs\"}}\n```";
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.tool, "read");
        assert_eq!(call.args.get("filePath"), Some(&json!("a.rs")));
    }

    #[test]
    fn test_bare_fence() {
        let text = "```\n{\"tool\":\"list\"}\n```";
        assert_eq!(parse_tool_call(text).unwrap().tool, "list");
    }

    #[test]
    fn test_inline_object_without_fence() {
        let text = "I'll run it: {\"tool\": \"run\", \"args\": {\"command\": \"ls\"}} now.";
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.tool, "run");
        assert_eq!(call.args.get("command"), Some(&json!("ls")));
    }

    #[test]
    fn test_fenced_block_wins_over_earlier_unrelated_object() {
        let text = "Config is {\"debug\": true}.\n```json\n{\"tool\": \"write\", \"args\": {\"filePath\": \"x\"}}\n```";
        assert_eq!(parse_tool_call(text).unwrap().tool, "write");
    }

    #[test]
    fn test_missing_args_default_to_empty() {
        let call = parse_tool_call("{\"tool\":\"savefile\"}").unwrap();
        assert_eq!(call.tool, "savefile");
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_non_object_args_default_to_empty() {
        let call = parse_tool_call("{\"tool\":\"list\",\"args\":[1,2]}").unwrap();
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_tool_name_is_lowercased_and_trimmed() {
        let call = parse_tool_call("{\"tool\":\"  ApplyDiff \"}").unwrap();
        assert_eq!(call.tool, "applydiff");
    }

    #[test]
    fn test_braces_inside_strings_are_skipped() {
        let text = r#"{"tool": "write", "args": {"content": "fn main() { let s = \"}\"; }"}}"#;
        let call = parse_tool_call(text).unwrap();
        assert_eq!(
            call.args.get("content"),
            Some(&json!("fn main() { let s = \"}\"; }"))
        );
    }

    #[test]
    fn test_prose_apostrophes_and_quotes_do_not_break_scan() {
        let text = "Here's the \"plan\": {\"tool\":\"find\",\"args\":{\"pattern\":\"*.rs\"}}";
        assert_eq!(parse_tool_call(text).unwrap().tool, "find");
    }

    #[test]
    fn test_invalid_candidates_are_skipped() {
        let text = "{not json} then {\"name\": \"x\"} then {\"tool\": \"\"} then {\"tool\":\"grep\"}";
        assert_eq!(parse_tool_call(text).unwrap().tool, "grep");
    }

    #[test]
    fn test_no_tool_call() {
        assert!(parse_tool_call("Final Answer: done").is_none());
        assert!(parse_tool_call("").is_none());
        assert!(parse_tool_call("{\"tool\": 5}").is_none());
    }
}
