//! Tool dispatch with per-call timeouts

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::agent::tool_call::AgentToolCall;
use crate::config::QuillConfig;
use crate::constants::defaults::TOOL_TIMEOUT_SECS;
use crate::diff::Operator;
use crate::session::EditSession;
use crate::tools::args::ToolInvocation;
use crate::tools::implementations::{self, SearchProvider, TOOL_SPECS};
use crate::workspace::Workspace;

/// Tool execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a success result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error result with JSON-formatted error message
    pub fn error(msg: impl std::fmt::Display) -> Self {
        Self {
            output: serde_json::json!({"error": msg.to_string()}).to_string(),
            is_error: true,
        }
    }

    /// Plain-text failure, for outcomes the model should read as prose
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// Parse tool parameters, returning a ToolResult error on failure
pub fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ToolResult> {
    serde_json::from_value(params)
        .map_err(|e| ToolResult::error(format!("Invalid parameters: {}", e)))
}

/// Context for tool execution
#[derive(Clone)]
pub struct ToolContext {
    pub session: Arc<EditSession>,
    pub config: Arc<QuillConfig>,
    /// Semantic search backend, when one is configured
    pub search: Option<Arc<dyn SearchProvider>>,
    /// Cancelled when the generation that issued the call is cancelled
    pub cancel: CancellationToken,
    /// Optional per-call timeout override
    pub timeout: Option<Duration>,
}

impl ToolContext {
    pub fn new(session: Arc<EditSession>, config: Arc<QuillConfig>) -> Self {
        Self {
            session,
            config,
            search: None,
            cancel: CancellationToken::new(),
            timeout: None,
        }
    }

    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        self.session.workspace()
    }

    pub fn operator(&self) -> &Arc<dyn Operator> {
        self.session.operator()
    }
}

/// Routes parsed tool calls to their handlers
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Default timeout for tool execution
    default_timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(TOOL_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &QuillConfig) -> Self {
        Self {
            default_timeout: config.tool_timeout(),
        }
    }

    /// Names of every built-in tool, in prompt order
    pub fn names(&self) -> Vec<&'static str> {
        TOOL_SPECS.iter().map(|spec| spec.name).collect()
    }

    /// Execute a tool call with timeout. Every failure comes back as a
    /// `ToolResult` so the agent loop can keep going.
    pub async fn execute(&self, call: &AgentToolCall, ctx: &ToolContext) -> ToolResult {
        tracing::info!(tool = %call.tool, "ToolRegistry: execute called");

        let invocation = match ToolInvocation::from_call(call) {
            Ok(invocation) => invocation,
            Err(e) => return e,
        };
        if let ToolInvocation::Unknown(name) = &invocation {
            tracing::warn!(tool = %name, "Unknown tool requested");
            return ToolResult::error(format!(
                "Unknown tool '{}'. Available tools: {}",
                name,
                self.names().join(", ")
            ));
        }

        let timeout = ctx.timeout.unwrap_or(self.default_timeout);
        let start = Instant::now();

        let result = match tokio::time::timeout(timeout, implementations::dispatch(invocation, ctx))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    tool = %call.tool,
                    timeout_secs = timeout.as_secs(),
                    "Tool execution timed out"
                );
                ToolResult::failure(format!(
                    "Tool '{}' timed out after {} seconds",
                    call.tool,
                    timeout.as_secs()
                ))
            }
        };

        tracing::info!(
            tool = %call.tool,
            duration_ms = start.elapsed().as_millis() as u64,
            is_error = result.is_error,
            "Tool finished"
        );
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::diff::AutoApprove;
    use serde_json::json;
    use tempfile::TempDir;

    pub(crate) fn create_test_context() -> (TempDir, ToolContext) {
        create_context_with(Arc::new(AutoApprove))
    }

    pub(crate) fn create_context_with(operator: Arc<dyn Operator>) -> (TempDir, ToolContext) {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        let session = Arc::new(EditSession::new(workspace, operator));
        let ctx = ToolContext::new(session, Arc::new(QuillConfig::default()));
        (dir, ctx)
    }

    pub(crate) fn call(tool: &str, args: Value) -> AgentToolCall {
        AgentToolCall {
            tool: tool.to_string(),
            args: args.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_lists_available_tools() {
        let registry = ToolRegistry::new();
        let (_dir, ctx) = create_test_context();

        let result = registry.execute(&call("savefile", json!({})), &ctx).await;

        assert!(result.is_error);
        assert!(result.output.contains("Unknown tool 'savefile'"));
        for name in registry.names() {
            assert!(result.output.contains(name), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_reported() {
        let registry = ToolRegistry::new();
        let (_dir, ctx) = create_test_context();

        let result = registry.execute(&call("read", json!({})), &ctx).await;

        assert!(result.is_error);
        assert!(result.output.contains("Invalid parameters"));
        assert!(result.output.contains("filePath"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_text() {
        let registry = ToolRegistry::new();
        let (_dir, ctx) = create_test_context();
        let ctx = ctx.with_timeout(Duration::from_millis(50));

        let result = registry
            .execute(&call("run", json!({"command": "sleep 5"})), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.output.starts_with("Tool 'run' timed out after"));
    }

    #[test]
    fn test_error_is_json_and_failure_is_prose() {
        let error = ToolResult::error("File not found: a.rs");
        let parsed: Value = serde_json::from_str(&error.output).unwrap();
        assert_eq!(parsed["error"], "File not found: a.rs");

        let failure = ToolResult::failure("Command rejected by user: rm -rf /");
        assert!(failure.is_error);
        assert_eq!(failure.output, "Command rejected by user: rm -rf /");
    }

    #[test]
    fn test_parse_params_accepts_aliases_and_numeric_strings() {
        use crate::tools::args::ReadArgs;

        let args: ReadArgs = parse_params(json!({"file_path": "src/lib.rs", "chunk": "2"})).unwrap();
        assert_eq!(args.file_path, "src/lib.rs");
        assert_eq!(args.chunk, Some(2));

        let err = parse_params::<ReadArgs>(json!({"chunk": -1, "filePath": "a"})).unwrap_err();
        assert!(err.output.contains("non-negative"));
    }

    #[tokio::test]
    async fn test_execute_runs_known_tool() {
        let registry = ToolRegistry::new();
        let (dir, ctx) = create_test_context();
        std::fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let result = registry
            .execute(&call("read", json!({"path": "notes.txt"})), &ctx)
            .await;

        assert!(!result.is_error, "{}", result.output);
        assert!(result.output.contains("hello"));
    }
}
