//! Grep tool - Regex search over a gitignore-aware walk

use regex::RegexBuilder;
use serde_json::json;
use std::path::Path;

use crate::constants::limits::{MAX_PATTERN_LENGTH, MAX_SEARCH_RESULTS};
use crate::tools::args::GrepArgs;
use crate::tools::path_utils::{locate, walker};
use crate::tools::{ToolContext, ToolResult};

/// Longest line echoed back per match
const MAX_LINE_CHARS: usize = 300;

/// Validates a regex pattern before compiling it.
///
/// The `regex` engine has no catastrophic backtracking, but very long
/// patterns are expensive to compile and nested quantifiers are almost
/// always a mistake in model-written searches.
fn validate_pattern(pattern: &str) -> Result<(), String> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(format!(
            "Pattern too long ({} chars, max {}). Consider breaking into smaller searches.",
            pattern.len(),
            MAX_PATTERN_LENGTH
        ));
    }

    // Look for: [+*] followed by ) followed by optional ? then [+*]
    // This catches patterns like (a+)+, (a*)+, (a+)*, (a+)+?, etc.
    let bytes = pattern.as_bytes();
    let len = bytes.len();

    for i in 0..len.saturating_sub(2) {
        if !(matches!(bytes[i], b'+' | b'*') && bytes[i + 1] == b')') {
            continue;
        }
        let next = bytes[i + 2];
        let nested = matches!(next, b'+' | b'*')
            || (next == b'?' && matches!(bytes.get(i + 3), Some(b'+' | b'*')));
        if nested {
            return Err(format!(
                "Potentially dangerous pattern: nested quantifiers near position {}. \
                 Patterns like (a+)+ or (a*)* can cause performance issues.",
                i
            ));
        }
    }

    Ok(())
}

pub(super) async fn execute(args: GrepArgs, ctx: &ToolContext) -> ToolResult {
    if let Err(e) = validate_pattern(&args.pattern) {
        return ToolResult::error(e);
    }

    let regex = match RegexBuilder::new(&args.pattern)
        .case_insensitive(args.ignore_case.unwrap_or(false))
        .size_limit(1 << 20)
        .build()
    {
        Ok(r) => r,
        Err(e) => return ToolResult::error(format!("Invalid regex: {}", e)),
    };

    let root = ctx.workspace().root().to_path_buf();
    let target = match args.path.as_deref().map(str::trim) {
        None | Some("") | Some(".") => root.clone(),
        Some(path) => match locate(ctx, path) {
            Ok((_, abs)) if abs.exists() => abs,
            Ok((rel, _)) => return ToolResult::error(format!("Path not found: {}", rel)),
            Err(e) => return e,
        },
    };

    let cancel = ctx.cancel.clone();
    let searched = tokio::task::spawn_blocking(move || {
        let mut matches = Vec::new();
        let mut files_searched = 0usize;
        let mut truncated = false;

        'files: for entry in walker(&target, None).flatten() {
            if cancel.is_cancelled() {
                break;
            }
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(text) = read_text(entry.path()) else {
                continue;
            };
            files_searched += 1;

            for (idx, line) in text.lines().enumerate() {
                if !regex.is_match(line) {
                    continue;
                }
                if matches.len() == MAX_SEARCH_RESULTS {
                    truncated = true;
                    break 'files;
                }
                matches.push(json!({
                    "file": relative_to(&root, entry.path()),
                    "line": idx + 1,
                    "text": line.chars().take(MAX_LINE_CHARS).collect::<String>(),
                }));
            }
        }
        (matches, files_searched, truncated)
    })
    .await;

    match searched {
        Ok((matches, files_searched, truncated)) => {
            tracing::debug!(
                pattern = %args.pattern,
                matches = matches.len(),
                files_searched,
                "Grep finished"
            );
            ToolResult::success(
                json!({
                    "matches": matches,
                    "count": matches.len(),
                    "filesSearched": files_searched,
                    "truncated": truncated
                })
                .to_string(),
            )
        }
        Err(e) => ToolResult::error(format!("Search failed: {}", e)),
    }
}

/// File contents when they look like text
fn read_text(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.iter().take(8000).any(|b| *b == 0) {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::tests::create_test_context;
    use serde_json::Value;

    fn grep_args(pattern: &str, path: Option<&str>, ignore_case: bool) -> GrepArgs {
        GrepArgs {
            pattern: pattern.to_string(),
            path: path.map(String::from),
            ignore_case: Some(ignore_case),
        }
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("fn \\w+").is_ok());
        assert!(validate_pattern("(a+)+").unwrap_err().contains("nested quantifiers"));
        assert!(validate_pattern("(a*)*").is_err());
        assert!(validate_pattern("(a+)?+").is_err());
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        assert!(validate_pattern(&long).unwrap_err().contains("Pattern too long"));
    }

    #[tokio::test]
    async fn test_finds_matching_lines() {
        let (dir, ctx) = create_test_context();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "use std;\nfn parse() {}\nfn apply() {}\n")
            .unwrap();

        let result = execute(grep_args(r"fn \w+", None, false), &ctx).await;

        assert!(!result.is_error);
        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["matches"][0]["file"], "src/lib.rs");
        assert_eq!(value["matches"][0]["line"], 2);
        assert_eq!(value["matches"][1]["text"], "fn apply() {}");
    }

    #[tokio::test]
    async fn test_ignore_case_and_path_filter() {
        let (dir, ctx) = create_test_context();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/a.md"), "TODO: write\n").unwrap();
        std::fs::write(dir.path().join("b.md"), "todo here\n").unwrap();

        let result = execute(grep_args("todo", Some("docs"), true), &ctx).await;

        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["matches"][0]["file"], "docs/a.md");
    }

    #[tokio::test]
    async fn test_caps_matches() {
        let (dir, ctx) = create_test_context();
        std::fs::write(dir.path().join("many.txt"), "hit\n".repeat(MAX_SEARCH_RESULTS + 10))
            .unwrap();

        let result = execute(grep_args("hit", None, false), &ctx).await;

        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["count"], MAX_SEARCH_RESULTS);
        assert_eq!(value["truncated"], true);
    }

    #[tokio::test]
    async fn test_skips_binary_files() {
        let (dir, ctx) = create_test_context();
        std::fs::write(dir.path().join("blob.bin"), b"hit\0\x01\x02").unwrap();

        let result = execute(grep_args("hit", None, false), &ctx).await;
        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["count"], 0);
    }

    #[tokio::test]
    async fn test_invalid_regex() {
        let (_dir, ctx) = create_test_context();
        let result = execute(grep_args("(unclosed", None, false), &ctx).await;
        assert!(result.is_error);
        assert!(result.output.contains("Invalid regex"));
    }
}
