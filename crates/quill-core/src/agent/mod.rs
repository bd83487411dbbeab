//! Agent loop and its building blocks
//!
//! ## Core Components
//! - `AgentRunner` - Step-bounded think/act/observe loop
//! - `parse_tool_call` - Tool-call extraction from free-form output
//! - `AgentCancellation` - At most one generation in flight
//! - `AgentEvent` / `AgentState` - Presentation events and run states

pub mod cancellation;
pub mod history;
pub mod prompt;
pub mod runner;
pub mod state;
pub mod tool_call;

pub use cancellation::{AgentCancellation, Generation};
pub use history::prune_history;
pub use prompt::system_prompt;
pub use runner::{AgentError, AgentRun, AgentRunner};
pub use state::{AgentEvent, AgentState};
pub use tool_call::{parse_tool_call, AgentToolCall};
