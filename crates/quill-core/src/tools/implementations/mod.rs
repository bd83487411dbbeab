//! Built-in tool implementations

mod applydiff;
mod find;
mod grep;
mod list;
mod read;
mod run;
mod search;
mod write;

pub use run::truncate_output;
pub use search::{SearchHit, SearchProvider};

use crate::session::ApplyOutcome;
use crate::tools::args::ToolInvocation;
use crate::tools::registry::{ToolContext, ToolResult};

/// Prompt-facing description of one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

pub const TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: "run",
        args: "{command, timeout?}",
        description: "Run a shell command in the project root (timeout in seconds). The user confirms each command.",
    },
    ToolSpec {
        name: "read",
        args: "{filePath, chunk?}",
        description: "Read a file. Large files are returned in chunks; pass the reported nextChunk to continue.",
    },
    ToolSpec {
        name: "write",
        args: "{filePath, content}",
        description: "Create or replace a whole file. The user reviews the change first.",
    },
    ToolSpec {
        name: "applydiff",
        args: "{diffContent}",
        description: "Apply a unified diff (--- a/path, +++ b/path, @@ hunks) to one or more files. Use /dev/null to create or delete.",
    },
    ToolSpec {
        name: "list",
        args: "{path?}",
        description: "List one directory level, honoring .gitignore.",
    },
    ToolSpec {
        name: "find",
        args: "{pattern}",
        description: "Find files by glob pattern (e.g. 'src/**/*.rs'), newest first, up to 100.",
    },
    ToolSpec {
        name: "grep",
        args: "{pattern, path?, ignoreCase?}",
        description: "Search file contents with a regex, up to 100 matching lines.",
    },
    ToolSpec {
        name: "search",
        args: "{query, k?}",
        description: "Semantic code search returning the k most relevant snippets.",
    },
];

pub(crate) async fn dispatch(invocation: ToolInvocation, ctx: &ToolContext) -> ToolResult {
    match invocation {
        ToolInvocation::Run(args) => run::execute(args, ctx).await,
        ToolInvocation::Read(args) => read::execute(args, ctx).await,
        ToolInvocation::Write(args) => write::execute(args, ctx).await,
        ToolInvocation::ApplyDiff(args) => applydiff::execute(args, ctx).await,
        ToolInvocation::List(args) => list::execute(args, ctx).await,
        ToolInvocation::Find(args) => find::execute(args, ctx).await,
        ToolInvocation::Grep(args) => grep::execute(args, ctx).await,
        ToolInvocation::Search(args) => search::execute(args, ctx).await,
        ToolInvocation::Unknown(name) => ToolResult::error(format!("Unknown tool '{}'", name)),
    }
}

/// Map a two-phase apply outcome onto tool output. Declined or aborted
/// applies are errors the model should react to.
fn outcome_result(outcome: ApplyOutcome) -> ToolResult {
    match outcome {
        ApplyOutcome::Applied { .. } | ApplyOutcome::NoChanges => {
            ToolResult::success(outcome.summary())
        }
        ApplyOutcome::Cancelled | ApplyOutcome::Aborted { .. } => {
            ToolResult::failure(outcome.summary())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_unique_and_lowercase() {
        let mut seen = HashSet::new();
        for spec in TOOL_SPECS {
            assert!(seen.insert(spec.name), "duplicate tool {}", spec.name);
            assert_eq!(spec.name, spec.name.to_lowercase());
        }
        assert_eq!(TOOL_SPECS.len(), 8);
    }

    #[test]
    fn test_outcome_result_flags_declines() {
        assert!(!outcome_result(ApplyOutcome::NoChanges).is_error);
        let cancelled = outcome_result(ApplyOutcome::Cancelled);
        assert!(cancelled.is_error);
        assert_eq!(cancelled.output, "Apply cancelled by user");
    }
}
