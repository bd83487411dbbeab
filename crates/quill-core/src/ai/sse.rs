//! SSE (Server-Sent Events) stream processing utilities
//!
//! Handles line framing across network chunks and decoding of
//! OpenAI-compatible `chat.completion.chunk` payloads.

use serde_json::Value;
use tracing::debug;

use super::chat::ModelError;

/// One decoded SSE data event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    /// `data: [DONE]` end-of-stream marker
    Done,
}

/// Reassembles SSE lines split across arbitrary byte chunks
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    /// Bytes after the last newline seen so far
    partial: Vec<u8>,
    bytes_received: usize,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every complete data event
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.bytes_received += bytes.len();
        self.partial.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_line(line.trim_end_matches(['\r', '\n'])) {
                events.push(event);
            }
        }
        debug!(
            "SSE chunk received: {} bytes (total: {} bytes)",
            bytes.len(),
            self.bytes_received
        );
        events
    }

    /// Flush a final unterminated line at end of stream
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.partial.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.partial);
        let line = String::from_utf8_lossy(&rest);
        parse_line(line.trim_end_matches('\r'))
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    // Skip empty lines and SSE comments
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}

/// Extract the text delta from a streamed chat completion chunk.
///
/// Returns `Ok(None)` for chunks without content (role announcements,
/// finish markers). An `error` object in the payload becomes an error.
pub fn parse_chat_delta(data: &str) -> Result<Option<String>, ModelError> {
    if data.trim().is_empty() {
        return Ok(None);
    }
    let json: Value = serde_json::from_str(data)
        .map_err(|e| ModelError::Decode(format!("{}: {}", e, truncate(data, 200))))?;

    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ModelError::Decode(message));
    }

    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| {
            choice
                .get("delta")
                .and_then(|d| d.get("content"))
                .or_else(|| choice.get("message").and_then(|m| m.get("content")))
        })
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    Ok(content)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
