//! Model access: the chat trait and an OpenAI-compatible streaming client

pub mod chat;
pub mod openai;
pub mod sse;
pub mod types;

pub use chat::{ChatModel, ChunkStream, ModelError};
pub use openai::OpenAiClient;
pub use types::{ChatMessage, Role};
