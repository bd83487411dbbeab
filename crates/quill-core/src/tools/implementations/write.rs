//! Write tool - Whole-file writes through the reviewed apply pipeline

use crate::tools::args::WriteArgs;
use crate::tools::{ToolContext, ToolResult};

use super::outcome_result;

pub(super) async fn execute(args: WriteArgs, ctx: &ToolContext) -> ToolResult {
    tracing::info!(path = %args.file_path, bytes = args.content.len(), "Write requested");
    match ctx
        .session
        .apply_file_write(&args.file_path, &args.content)
        .await
    {
        Ok(outcome) => outcome_result(outcome),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DriftDecision, ReviewDecision};
    use crate::session::tests::ScriptedOperator;
    use crate::tools::registry::tests::{create_context_with, create_test_context};
    use std::sync::Arc;

    fn write_args(path: &str, content: &str) -> WriteArgs {
        WriteArgs {
            file_path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_creates_file_and_records_undo() {
        let (dir, ctx) = create_test_context();

        let result = execute(write_args("src/new.rs", "fn main() {}\n"), &ctx).await;

        assert!(!result.is_error, "{}", result.output);
        assert!(result.output.contains("created src/new.rs"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/new.rs")).unwrap(),
            "fn main() {}\n"
        );
        assert_eq!(ctx.session.undo_depth(), 1);
    }

    #[tokio::test]
    async fn test_identical_write_is_no_change() {
        let (dir, ctx) = create_test_context();
        std::fs::write(dir.path().join("same.txt"), "x\n").unwrap();

        let result = execute(write_args("same.txt", "x\n"), &ctx).await;

        assert!(!result.is_error);
        assert_eq!(result.output, "No changes to apply");
        assert_eq!(ctx.session.undo_depth(), 0);
    }

    #[tokio::test]
    async fn test_declined_write_leaves_disk_untouched() {
        let operator = Arc::new(ScriptedOperator::new(
            ReviewDecision::Cancel,
            DriftDecision::Cancel,
            true,
        ));
        let (dir, ctx) = create_context_with(operator);

        let result = execute(write_args("a.txt", "data"), &ctx).await;

        assert!(result.is_error);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_write_outside_workspace_rejected() {
        let (_dir, ctx) = create_test_context();
        let result = execute(write_args("../escape.txt", "x"), &ctx).await;
        assert!(result.is_error);
        assert!(result.output.contains("outside the workspace"));
    }
}
