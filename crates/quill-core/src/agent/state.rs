//! Agent run states and events

use serde::Serialize;

/// Lifecycle of one agent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Analyzing,
    Thinking,
    ToolExecuting,
    Done,
    StepLimitReached,
    Cancelled,
    Error,
}

impl AgentState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AgentState::Done
                | AgentState::StepLimitReached
                | AgentState::Cancelled
                | AgentState::Error
        )
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AgentState::Analyzing => "analyzing",
            AgentState::Thinking => "thinking",
            AgentState::ToolExecuting => "running tool",
            AgentState::Done => "done",
            AgentState::StepLimitReached => "step limit reached",
            AgentState::Cancelled => "cancelled",
            AgentState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Presentation events emitted while a run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    State(AgentState),
    /// Raw streamed model text
    Chunk(String),
    Thought(String),
    Plan(String),
    ToolStarted {
        tool: String,
        args: serde_json::Value,
    },
    ToolFinished {
        tool: String,
        output: String,
        is_error: bool,
    },
    Final(String),
}
