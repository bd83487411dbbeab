//! Quill Core - Shared library for the quill coding agent
//!
//! This crate provides the core functionality for the `quill` CLI:
//! - Unified-diff parsing and application with preview, drift checks and undo
//! - Tool execution framework
//! - The step-bounded agent loop and tool-call extraction
//! - Token budgeting for file context
//! - OpenAI-compatible model client
//! - Session storage

pub mod agent;
pub mod ai;
pub mod config;
pub mod constants;
pub mod context;
pub mod diff;
pub mod paths;
pub mod session;
pub mod storage;
pub mod tools;
pub mod workspace;

// Re-exports for convenience
pub use agent::{AgentCancellation, AgentError, AgentEvent, AgentRunner, AgentState};
pub use ai::{ChatMessage, ChatModel, OpenAiClient, Role};
pub use config::QuillConfig;
pub use diff::{DiffError, Operator};
pub use session::{ApplyOutcome, EditSession, UndoOutcome};
pub use storage::{SessionStore, StoredSession};
pub use tools::{ToolContext, ToolRegistry};
pub use workspace::Workspace;
