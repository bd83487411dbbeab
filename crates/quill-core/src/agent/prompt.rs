//! System prompt and response section parsing
//!
//! Thought/Plan extraction is presentation only; control flow is decided by
//! the tool-call extractor alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::TOOL_SPECS;

static THOUGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Thought:\s*(.*?)(?:\n\s*(?:Plan|Action|Final Answer):|```|\z)").unwrap()
});

static PLAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Plan:\s*(.*?)(?:\n\s*(?:Thought|Action|Final Answer):|```|\z)").unwrap()
});

static FINAL_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Final Answer:\s*(.*)\z").unwrap());

/// System prompt describing the response protocol and the tool table
pub fn system_prompt(workspace_root: &std::path::Path) -> String {
    let mut tools = String::new();
    for spec in TOOL_SPECS {
        tools.push_str(&format!("- {} {}: {}\n", spec.name, spec.args, spec.description));
    }
    format!(
        r#"You are quill, a coding agent working inside the project at {root}.

Work in steps. Each reply has this shape:

Thought: what you know and what you need next
Plan: the remaining steps, briefly
Action: exactly one tool call as a fenced JSON block:
```json
{{"tool": "<name>", "args": {{...}}}}
```

You will receive the tool result as "Tool Output: ...". When the task is
complete, reply without any tool call and end with:

Final Answer: <summary for the user>

Available tools:
{tools}
Rules:
- Paths are relative to the project root.
- Read a file before changing it. Prefer applydiff for edits to existing files;
  context lines must match the file exactly.
- One tool call per reply."#,
        root = workspace_root.display(),
        tools = tools
    )
}

fn section(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn extract_thought(response: &str) -> Option<String> {
    section(&THOUGHT, response)
}

pub fn extract_plan(response: &str) -> Option<String> {
    section(&PLAN, response)
}

/// Text after `Final Answer:`, or the whole trimmed response without one
pub fn final_answer(response: &str) -> String {
    section(&FINAL_ANSWER, response).unwrap_or_else(|| response.trim().to_string())
}
