//! The think → act → observe loop
//!
//! Each step streams one model response. A response holding a tool call is
//! executed and its output fed back as the next user turn; a response
//! without one ends the run. Runs stop after `MAX_STEPS` model calls.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::history::prune_history;
use super::prompt::{extract_plan, extract_thought, final_answer, system_prompt};
use super::state::{AgentEvent, AgentState};
use super::tool_call::parse_tool_call;
use crate::ai::{ChatMessage, ChatModel, ModelError};
use crate::constants::agent::MAX_STEPS;
use crate::context::resolve_context;
use crate::tools::{ToolContext, ToolRegistry};

/// Why a run stopped early
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("generation cancelled")]
    Cancelled,

    #[error("no response from model for {} s", .idle.as_secs())]
    Timeout { idle: Duration },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result of a run that was not interrupted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRun {
    /// `Done` or `StepLimitReached`
    pub status: AgentState,
    pub final_answer: Option<String>,
    /// Model calls made
    pub steps: usize,
}

pub struct AgentRunner {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    ctx: ToolContext,
    inactivity_timeout: Duration,
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl AgentRunner {
    pub fn new(model: Arc<dyn ChatModel>, registry: ToolRegistry, ctx: ToolContext) -> Self {
        let inactivity_timeout = ctx.config.inactivity_timeout();
        Self {
            model,
            registry,
            ctx,
            inactivity_timeout,
            events: None,
        }
    }

    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Fresh history holding only the system prompt
    pub fn start_history(&self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(system_prompt(self.ctx.workspace().root()))]
    }

    /// User turn with mentioned and pinned files appended as context
    pub async fn compose_user_turn(&self, message: &str) -> ChatMessage {
        let pinned = self.ctx.session.pinned();
        let context = resolve_context(
            message,
            &pinned,
            self.ctx.workspace(),
            self.ctx.config.context_budget(),
        )
        .await;
        if context.is_empty() {
            ChatMessage::user(message)
        } else {
            ChatMessage::user(format!("{}\n\n{}", message, context.render()))
        }
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event);
        }
    }

    /// Run until a final answer, the step limit, cancellation or a timeout.
    ///
    /// `history` must start with the system prompt and end with the user
    /// turn. It is updated in place, so partial progress survives errors.
    pub async fn run(
        &self,
        history: &mut Vec<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<AgentRun, AgentError> {
        for step in 1..=MAX_STEPS {
            if cancel.is_cancelled() {
                tracing::info!(step, "Agent cancelled");
                self.emit(AgentEvent::State(AgentState::Cancelled));
                return Err(AgentError::Cancelled);
            }

            let state = if step == 1 {
                AgentState::Analyzing
            } else {
                AgentState::Thinking
            };
            tracing::info!(step, state = %state, "Agent step");
            self.emit(AgentEvent::State(state));

            // Callers may hand in a transcript that grew across turns
            prune_history(history);

            let response = match self.stream_response(history, cancel).await {
                Ok(text) => text,
                Err(e) => {
                    let terminal = match e {
                        AgentError::Cancelled => AgentState::Cancelled,
                        _ => AgentState::Error,
                    };
                    tracing::warn!(step, error = %e, "Agent run interrupted");
                    self.emit(AgentEvent::State(terminal));
                    return Err(e);
                }
            };

            if let Some(thought) = extract_thought(&response) {
                self.emit(AgentEvent::Thought(thought));
            }
            if let Some(plan) = extract_plan(&response) {
                self.emit(AgentEvent::Plan(plan));
            }

            let Some(call) = parse_tool_call(&response) else {
                let answer = final_answer(&response);
                history.push(ChatMessage::assistant(response));
                prune_history(history);
                tracing::info!(step, "Agent finished");
                self.emit(AgentEvent::Final(answer.clone()));
                self.emit(AgentEvent::State(AgentState::Done));
                return Ok(AgentRun {
                    status: AgentState::Done,
                    final_answer: Some(answer),
                    steps: step,
                });
            };

            self.emit(AgentEvent::State(AgentState::ToolExecuting));
            self.emit(AgentEvent::ToolStarted {
                tool: call.tool.clone(),
                args: serde_json::Value::Object(call.args.clone()),
            });

            let ctx = self.ctx.clone().with_cancellation(cancel.clone());
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(step, tool = %call.tool, "Agent cancelled during tool call");
                    self.emit(AgentEvent::State(AgentState::Cancelled));
                    return Err(AgentError::Cancelled);
                }
                result = self.registry.execute(&call, &ctx) => result,
            };

            self.emit(AgentEvent::ToolFinished {
                tool: call.tool.clone(),
                output: result.output.clone(),
                is_error: result.is_error,
            });

            history.push(ChatMessage::assistant(response));
            history.push(ChatMessage::user(format!("Tool Output: {}", result.output)));
            prune_history(history);
        }

        tracing::info!(steps = MAX_STEPS, "Agent reached step limit");
        self.emit(AgentEvent::State(AgentState::StepLimitReached));
        Ok(AgentRun {
            status: AgentState::StepLimitReached,
            final_answer: None,
            steps: MAX_STEPS,
        })
    }

    /// Stream one response, bounding each wait by the inactivity timeout
    async fn stream_response(
        &self,
        history: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let idle = self.inactivity_timeout;

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            started = tokio::time::timeout(idle, self.model.stream_chat(history)) => match started {
                Ok(stream) => stream?,
                Err(_) => return Err(AgentError::Timeout { idle }),
            },
        };

        let mut text = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                next = tokio::time::timeout(idle, stream.next()) => next,
            };
            match next {
                Ok(Some(chunk)) => {
                    let chunk = chunk?;
                    self.emit(AgentEvent::Chunk(chunk.clone()));
                    text.push_str(&chunk);
                }
                Ok(None) => break,
                Err(_) => return Err(AgentError::Timeout { idle }),
            }
        }
        Ok(text)
    }
}
