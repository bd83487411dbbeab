//! `@path` mentions and pinned files resolved into prompt context

use once_cell::sync::Lazy;
use regex::Regex;

use super::budget::{chunk_for_budget, ChunkedTextForTokenBudget};
use crate::workspace::Workspace;

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s(\[])@([A-Za-z0-9_./\\-]+)").unwrap());

/// Budget knobs for context resolution
#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
    pub max_tokens: usize,
    pub chunk_size_chars: usize,
    pub chars_per_token: usize,
}

/// Outcome for one referenced file
#[derive(Debug, Clone)]
pub enum ContextEntry {
    Included {
        path: String,
        content: ChunkedTextForTokenBudget,
    },
    Failed {
        path: String,
        reason: String,
    },
}

impl ContextEntry {
    pub fn path(&self) -> &str {
        match self {
            ContextEntry::Included { path, .. } | ContextEntry::Failed { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedContext {
    pub entries: Vec<ContextEntry>,
}

impl ResolvedContext {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the entries as a context block to append to the user turn
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from("<context>\n");
        for entry in &self.entries {
            match entry {
                ContextEntry::Included { path, content } => {
                    out.push_str(&format!("<file path=\"{}\">\n", path));
                    let text = content.text();
                    out.push_str(&text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                    if content.truncated {
                        out.push_str(&format!(
                            "[truncated: {} of ~{} tokens shown]\n",
                            content.used_tokens, content.estimated_total_tokens
                        ));
                    }
                    out.push_str("</file>\n");
                }
                ContextEntry::Failed { path, reason } => {
                    out.push_str(&format!("<file path=\"{}\" error=\"{}\" />\n", path, reason));
                }
            }
        }
        out.push_str("</context>");
        out
    }
}

/// `@path` mentions in order of appearance, without duplicates
pub fn extract_mentions(message: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in MENTION.captures_iter(message) {
        let Some(raw) = caps.get(1) else { continue };
        let path = raw.as_str().trim_end_matches(['.', ',', ':', ';']);
        if !path.is_empty() && !seen.iter().any(|p: &String| p == path) {
            seen.push(path.to_string());
        }
    }
    seen
}

/// Load mentioned and pinned files, each under a fair share of the budget.
///
/// Sources are mentions first, then pins, deduplicated by normalized path.
/// Failures become inline entries and never abort resolution.
pub async fn resolve_context(
    message: &str,
    pinned: &[String],
    workspace: &Workspace,
    budget: ContextBudget,
) -> ResolvedContext {
    let mut sources: Vec<String> = Vec::new();
    let mut failures: Vec<ContextEntry> = Vec::new();
    let mut located = Vec::new();

    for raw in extract_mentions(message).into_iter().chain(pinned.iter().cloned()) {
        match workspace.locate(&raw) {
            Ok((rel, abs)) => {
                if !sources.contains(&rel) {
                    sources.push(rel.clone());
                    located.push((rel, abs));
                }
            }
            Err(e) => {
                if !failures.iter().any(|f| f.path() == raw) {
                    failures.push(ContextEntry::Failed {
                        path: raw,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    let share = if located.is_empty() {
        0
    } else {
        budget.max_tokens / located.len()
    };

    let mut entries = Vec::with_capacity(located.len() + failures.len());
    for (rel, abs) in located {
        let entry = match workspace.read_state(&abs).await {
            Ok(Some(text)) => ContextEntry::Included {
                content: chunk_for_budget(
                    &text,
                    budget.chunk_size_chars,
                    share,
                    budget.chars_per_token,
                ),
                path: rel,
            },
            Ok(None) => ContextEntry::Failed {
                path: rel,
                reason: "file not found".to_string(),
            },
            Err(e) => ContextEntry::Failed {
                path: rel,
                reason: e.to_string(),
            },
        };
        entries.push(entry);
    }
    entries.extend(failures);

    tracing::debug!(files = entries.len(), share, "Resolved message context");
    ResolvedContext { entries }
}
