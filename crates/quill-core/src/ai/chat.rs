//! Chat model abstraction consumed by the agent loop

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;

use super::types::ChatMessage;

/// Errors from the model transport
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode model response: {0}")]
    Decode(String),

    #[error("model client misconfigured: {0}")]
    Config(String),
}

/// Incremental text chunks of one model response
pub type ChunkStream = BoxStream<'static, Result<String, ModelError>>;

/// A chat-completion backend
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start streaming a completion for `messages`.
    ///
    /// Dropping the stream abandons the request.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, ModelError>;

    /// Collect a full completion
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let mut stream = self.stream_chat(messages).await?;
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }

    /// Single-turn code generation
    async fn generate_code(&self, prompt: &str) -> Result<String, ModelError> {
        let messages = [
            ChatMessage::system(
                "You write code. Reply with only the requested code, no commentary.",
            ),
            ChatMessage::user(prompt),
        ];
        self.chat(&messages).await
    }
}
