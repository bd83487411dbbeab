//! Find tool - Find files by glob pattern

use glob::glob as glob_match;
use serde_json::json;
use std::path::Path;

use crate::constants::limits::MAX_SEARCH_RESULTS;
use crate::tools::args::FindArgs;
use crate::tools::path_utils::display_relative;
use crate::tools::{ToolContext, ToolResult};

pub(super) async fn execute(args: FindArgs, ctx: &ToolContext) -> ToolResult {
    let pattern = args.pattern.trim().replace('\\', "/");
    if pattern.is_empty() {
        return ToolResult::error("Pattern is empty");
    }
    if Path::new(&pattern).is_absolute() || pattern.split('/').any(|part| part == "..") {
        return ToolResult::error(format!(
            "Pattern must be relative to the workspace: {}",
            args.pattern
        ));
    }

    let root = ctx.workspace().root().to_path_buf();
    let full_pattern = root.join(&pattern);
    let pattern_str = full_pattern.to_string_lossy().into_owned();

    let entries = match glob_match(&pattern_str) {
        Ok(paths) => paths,
        Err(e) => return ToolResult::error(format!("Invalid pattern: {}", e)),
    };

    // Collect with mtime, keep only files inside the root, sort newest first
    let mut files: Vec<_> = entries
        .flatten()
        .filter_map(|entry| {
            let canonical = entry.canonicalize().ok()?;
            if !canonical.starts_with(&root) {
                return None;
            }
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            Some((entry, metadata.modified().unwrap_or(std::time::UNIX_EPOCH)))
        })
        .collect();

    files.sort_by(|a, b| b.1.cmp(&a.1));

    let matches: Vec<String> = files
        .iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|(path, _)| display_relative(ctx, path))
        .collect();

    ToolResult::success(
        json!({
            "matches": matches,
            "count": files.len(),
            "search_path": "."
        })
        .to_string(),
    )
}
