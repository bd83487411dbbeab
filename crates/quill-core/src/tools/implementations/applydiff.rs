//! Applydiff tool - Multi-file unified diffs through the reviewed apply pipeline

use crate::tools::args::ApplyDiffArgs;
use crate::tools::{ToolContext, ToolResult};

use super::outcome_result;

pub(super) async fn execute(args: ApplyDiffArgs, ctx: &ToolContext) -> ToolResult {
    match ctx.session.apply_patch_text(&args.diff_content).await {
        Ok(outcome) => outcome_result(outcome),
        Err(e) => {
            tracing::info!(kind = e.kind(), error = %e, "Diff rejected");
            ToolResult::error(e.to_string())
        }
    }
}
