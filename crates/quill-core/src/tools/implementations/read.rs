//! Read tool - Budgeted file reading in chunks

use serde_json::json;

use crate::context::{select_chunks, split_into_chunks};
use crate::tools::args::ReadArgs;
use crate::tools::path_utils::locate;
use crate::tools::{ToolContext, ToolResult};

pub(super) async fn execute(args: ReadArgs, ctx: &ToolContext) -> ToolResult {
    let (relative, abs) = match locate(ctx, &args.file_path) {
        Ok(p) => p,
        Err(e) => return e,
    };

    if abs.is_dir() {
        return ToolResult::error(format!("{} is a directory, use list", relative));
    }
    let bytes = match tokio::fs::read(&abs).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ToolResult::error(format!("File not found: {}", relative))
        }
        Err(e) => return ToolResult::error(format!("Failed to read {}: {}", relative, e)),
    };
    let content = String::from_utf8_lossy(&bytes);

    let budget = ctx.config.read_budget();
    let all = split_into_chunks(&content, budget.chunk_size_chars);
    let total_chunks = all.len();
    let start = args.chunk.unwrap_or(0);
    if start > 0 && start >= total_chunks {
        return ToolResult::error(format!(
            "Chunk {} is out of range: {} has {} chunk(s)",
            start, relative, total_chunks
        ));
    }

    let selected = select_chunks(
        all.into_iter().skip(start).collect(),
        budget.max_tokens,
        budget.chars_per_token,
    );
    let next_chunk = selected
        .truncated
        .then(|| start + selected.whole_chunk_count().max(1))
        .filter(|next| *next < total_chunks);

    tracing::debug!(
        path = %relative,
        start,
        total_chunks,
        used_tokens = selected.used_tokens,
        truncated = selected.truncated,
        "Read file"
    );

    let mut result = json!({
        "path": relative,
        "content": selected.text(),
        "chunk": start,
        "totalChunks": total_chunks,
        "truncated": selected.truncated,
    });
    if let Some(next) = next_chunk {
        result["nextChunk"] = json!(next);
        result["note"] = json!(format!(
            "Showing ~{} tokens. Call read with chunk {} to continue.",
            selected.used_tokens, next
        ));
    }
    ToolResult::success(result.to_string())
}
