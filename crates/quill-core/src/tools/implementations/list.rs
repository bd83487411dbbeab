//! List tool - One directory level, gitignore-aware

use serde_json::json;

use crate::constants::limits::MAX_LIST_ENTRIES;
use crate::tools::args::ListArgs;
use crate::tools::path_utils::{display_relative, resolve_dir, walker};
use crate::tools::{ToolContext, ToolResult};

pub(super) async fn execute(args: ListArgs, ctx: &ToolContext) -> ToolResult {
    let dir = match resolve_dir(ctx, args.path.as_deref()) {
        Ok(d) => d,
        Err(e) => return e,
    };

    let walk_dir = dir.clone();
    let listed = tokio::task::spawn_blocking(move || {
        let mut entries: Vec<(bool, String)> = walker(&walk_dir, Some(1))
            .flatten()
            .filter(|entry| entry.depth() == 1)
            .map(|entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                (is_dir, entry.file_name().to_string_lossy().into_owned())
            })
            .collect();
        // Directories first, then by name
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        entries
    })
    .await;

    let entries = match listed {
        Ok(entries) => entries,
        Err(e) => return ToolResult::error(format!("Failed to list directory: {}", e)),
    };

    let total = entries.len();
    let names: Vec<String> = entries
        .into_iter()
        .take(MAX_LIST_ENTRIES)
        .map(|(is_dir, name)| if is_dir { format!("{}/", name) } else { name })
        .collect();

    let path = match display_relative(ctx, &dir) {
        p if p.is_empty() => ".".to_string(),
        p => p,
    };
    ToolResult::success(
        json!({
            "path": path,
            "entries": names,
            "count": total,
            "truncated": total > MAX_LIST_ENTRIES
        })
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::tests::create_test_context;
    use serde_json::Value;

    #[tokio::test]
    async fn test_lists_one_level_dirs_first() {
        let (dir, ctx) = create_test_context();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/nested/deep.rs"), "").unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let result = execute(ListArgs::default(), &ctx).await;

        assert!(!result.is_error);
        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["path"], ".");
        assert_eq!(value["entries"], serde_json::json!(["src/", "a.txt", "b.txt"]));
    }

    #[tokio::test]
    async fn test_lists_subdirectory() {
        let (dir, ctx) = create_test_context();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();

        let args = ListArgs {
            path: Some("src".to_string()),
        };
        let result = execute(args, &ctx).await;

        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["path"], "src");
        assert_eq!(value["entries"], serde_json::json!(["lib.rs"]));
    }

    #[tokio::test]
    async fn test_skips_ignored_entries() {
        let (dir, ctx) = create_test_context();
        std::fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        std::fs::write(dir.path().join("debug.log"), "").unwrap();
        std::fs::write(dir.path().join("main.rs"), "").unwrap();

        let result = execute(ListArgs::default(), &ctx).await;

        assert!(!result.output.contains("debug.log"));
        assert!(result.output.contains("main.rs"));
    }

    #[tokio::test]
    async fn test_rejects_escape() {
        let (_dir, ctx) = create_test_context();
        let args = ListArgs {
            path: Some("..".to_string()),
        };
        assert!(execute(args, &ctx).await.is_error);
    }
}
