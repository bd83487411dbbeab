//! OpenAI-compatible `/chat/completions` streaming client
//!
//! Works against OpenAI, Ollama, LM Studio, vLLM and anything else that
//! speaks the same SSE protocol.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use super::chat::{ChatModel, ChunkStream, ModelError};
use super::sse::{parse_chat_delta, SseEvent, SseLineBuffer};
use super::types::ChatMessage;
use crate::config::QuillConfig;
use crate::constants;

pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Create the HTTP client with configuration suited to SSE streaming
    fn create_http_client() -> Client {
        // No overall timeout: the agent loop enforces an inactivity timeout per chunk
        Client::builder()
            .user_agent(concat!("quill/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(constants::http::CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client: {}. Using default client.", e);
                Client::new()
            })
    }

    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Self::create_http_client(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Build from config, reading the bearer token from `api_key_env` if set
    pub fn from_config(config: &QuillConfig) -> Result<Self, ModelError> {
        let api_key = match &config.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                ModelError::Config(format!("environment variable {} is not set", var))
            })?),
            None => None,
        };
        Ok(Self::new(&config.base_url, &config.model, api_key))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }
}

/// Unfold state while decoding the byte stream
struct DecodeState {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: SseLineBuffer,
    pending: VecDeque<Result<String, ModelError>>,
    finished: bool,
}

impl DecodeState {
    fn absorb(&mut self, event: SseEvent) {
        match event {
            SseEvent::Done => self.finished = true,
            SseEvent::Data(data) => match parse_chat_delta(&data) {
                Ok(Some(text)) => self.pending.push_back(Ok(text)),
                Ok(None) => {}
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.finished = true;
                }
            },
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, ModelError> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        let mut request = self.http.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        info!(model = %self.model, messages = messages.len(), "Starting chat stream");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Chat request rejected");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let state = DecodeState {
            bytes: response.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed(),
            buffer: SseLineBuffer::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, state));
                }
                if state.finished {
                    return None;
                }
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for event in state.buffer.push(&chunk) {
                            state.absorb(event);
                            if state.finished {
                                break;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        state.pending.push_back(Err(ModelError::Http(e)));
                        state.finished = true;
                    }
                    None => {
                        if let Some(event) = state.buffer.finish() {
                            state.absorb(event);
                        }
                        state.finished = true;
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_path_once() {
        let client = OpenAiClient::new("http://localhost:11434/v1/", "m", None);
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
        let client = OpenAiClient::new("https://api.example.com/v1/chat/completions", "m", None);
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_from_config_requires_key_variable() {
        let config = QuillConfig {
            api_key_env: Some("QUILL_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..QuillConfig::default()
        };
        assert!(matches!(
            OpenAiClient::from_config(&config),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn test_decode_state_stops_at_done() {
        let mut state = DecodeState {
            bytes: futures::stream::empty().boxed(),
            buffer: SseLineBuffer::new(),
            pending: VecDeque::new(),
            finished: false,
        };
        let events = state.buffer.push(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: [DONE]\n",
        );
        for event in events {
            state.absorb(event);
        }
        assert!(state.finished);
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.pending.pop_front().unwrap().unwrap(), "a");
    }
}
