//! Shared path validation utilities for tool implementations

use ignore::{Walk, WalkBuilder};
use std::path::{Path, PathBuf};

use crate::tools::registry::{ToolContext, ToolResult};

/// Resolve a file path inside the workspace.
/// Returns `(relative, absolute)` or a ToolResult error.
pub fn locate(ctx: &ToolContext, path: &str) -> Result<(String, PathBuf), ToolResult> {
    ctx.workspace()
        .locate(path)
        .map_err(|e| ToolResult::error(e.to_string()))
}

/// Resolve an optional directory argument; absent, empty or `.` means the root
pub fn resolve_dir(ctx: &ToolContext, path: Option<&str>) -> Result<PathBuf, ToolResult> {
    let root = ctx.workspace().root();
    let trimmed = path.map(str::trim).unwrap_or("");
    if trimmed.is_empty() || trimmed == "." || trimmed == "./" {
        return Ok(root.to_path_buf());
    }

    let (_, abs) = locate(ctx, trimmed)?;
    if !abs.is_dir() {
        return Err(ToolResult::error(format!("Not a directory: {}", trimmed)));
    }
    Ok(abs)
}

/// Forward-slash path relative to the workspace root, for tool output
pub fn display_relative(ctx: &ToolContext, path: &Path) -> String {
    path.strip_prefix(ctx.workspace().root())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Gitignore-aware walk under `root` that still shows dotfiles but never
/// descends into `.git`
pub fn walker(root: &Path, max_depth: Option<usize>) -> Walk {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(false);
    builder.follow_links(false);
    builder.require_git(false);
    builder.max_depth(max_depth);
    builder.filter_entry(|entry| entry.file_name() != ".git");
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::tests::create_test_context;

    #[test]
    fn test_resolve_dir_defaults_to_root() {
        let (_dir, ctx) = create_test_context();
        let root = ctx.workspace().root().to_path_buf();
        assert_eq!(resolve_dir(&ctx, None).unwrap(), root);
        assert_eq!(resolve_dir(&ctx, Some("")).unwrap(), root);
        assert_eq!(resolve_dir(&ctx, Some(".")).unwrap(), root);
    }

    #[test]
    fn test_resolve_dir_rejects_files_and_escapes() {
        let (dir, ctx) = create_test_context();
        std::fs::write(dir.path().join("f.txt"), "x").unwrap();

        let err = resolve_dir(&ctx, Some("f.txt")).unwrap_err();
        assert!(err.output.contains("Not a directory"));

        let err = locate(&ctx, "../outside.txt").unwrap_err();
        assert!(err.output.contains("outside the workspace"));
    }

    #[test]
    fn test_walker_honors_gitignore() {
        let (dir, _ctx) = create_test_context();
        std::fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/out.o"), "").unwrap();
        std::fs::write(dir.path().join("kept.rs"), "").unwrap();

        let seen: Vec<String> = walker(dir.path(), None)
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(seen.contains(&"kept.rs".to_string()));
        assert!(seen.contains(&".gitignore".to_string()));
        assert!(!seen.contains(&"out.o".to_string()));
    }

    #[test]
    fn test_display_relative() {
        let (_dir, ctx) = create_test_context();
        let abs = ctx.workspace().root().join("src").join("main.rs");
        assert_eq!(display_relative(&ctx, &abs), "src/main.rs");
    }
}
