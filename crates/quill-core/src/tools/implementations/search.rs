//! Search tool - Query a semantic search backend

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::tools::args::SearchArgs;
use crate::tools::{ToolContext, ToolResult};

const DEFAULT_RESULTS: usize = 5;
const MAX_RESULTS: usize = 25;

/// One ranked snippet returned by a [`SearchProvider`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub snippet: String,
    pub score: f32,
}

/// Semantic code search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// The `k` most relevant snippets for `query`, best first
    async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

pub(super) async fn execute(args: SearchArgs, ctx: &ToolContext) -> ToolResult {
    let Some(provider) = ctx.search.as_ref() else {
        return ToolResult::success(
            "Semantic search is not available in this session. Use grep or find instead.",
        );
    };

    let query = args.query.trim();
    if query.is_empty() {
        return ToolResult::error("Query is empty");
    }
    let k = args.k.unwrap_or(DEFAULT_RESULTS).clamp(1, MAX_RESULTS);

    match provider.search(query, k).await {
        Ok(hits) => {
            tracing::debug!(query = %query, hits = hits.len(), "Semantic search finished");
            ToolResult::success(
                json!({
                    "query": query,
                    "results": hits,
                    "count": hits.len()
                })
                .to_string(),
            )
        }
        Err(e) => ToolResult::error(format!("Search failed: {}", e)),
    }
}
