//! Tools the agent can call
//!
//! Provides the argument union, the dispatching registry and all built-in
//! tool implementations.

pub mod args;
pub mod implementations;
pub mod path_utils;
pub mod registry;

pub use args::ToolInvocation;
pub use implementations::{truncate_output, SearchHit, SearchProvider, ToolSpec, TOOL_SPECS};
pub use registry::{parse_params, ToolContext, ToolRegistry, ToolResult};
