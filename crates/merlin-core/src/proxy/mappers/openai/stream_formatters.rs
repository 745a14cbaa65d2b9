// OpenAI SSE chunk formatting helpers

use bytes::Bytes;
use merlin_types::error::ProxyError;
use merlin_types::protocol::openai::{
    ChatCompletionChunk, ChunkChoice, ChunkDelta, ErrorEnvelope,
};
use serde::Serialize;

use crate::proxy::common::random_id::generate_completion_id;

pub const CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const COMPLETION_OBJECT: &str = "chat.completion";
pub const ASSISTANT_ROLE: &str = "assistant";
pub const FINISH_STOP: &str = "stop";

/// Literal stream terminator.
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Identity shared by every chunk of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkContext {
    pub id: String,
    pub created: i64,
    pub model: String,
}

impl ChunkContext {
    pub fn new(model: impl Into<String>) -> Self {
        Self { id: generate_completion_id(), created: chrono::Utc::now().timestamp(), model: model.into() }
    }

    fn chunk(&self, delta: ChunkDelta, finish_reason: Option<&str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: CHUNK_OBJECT.to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice { index: 0, delta, finish_reason: finish_reason.map(str::to_string) }],
        }
    }

    /// Opening chunk: `role` only, no content.
    pub fn role_chunk(&self) -> ChatCompletionChunk {
        self.chunk(ChunkDelta { role: Some(ASSISTANT_ROLE.to_string()), content: None }, None)
    }

    pub fn content_chunk(&self, content: &str) -> ChatCompletionChunk {
        self.chunk(ChunkDelta { role: None, content: Some(content.to_string()) }, None)
    }

    /// Final chunk: empty content, `finish_reason: "stop"`.
    pub fn stop_chunk(&self) -> ChatCompletionChunk {
        self.chunk(ChunkDelta { role: None, content: Some(String::new()) }, Some(FINISH_STOP))
    }
}

/// Format one `data: <json>\n\n` frame.
#[inline]
pub fn sse_frame<T: Serialize>(payload: &T) -> Bytes {
    match serde_json::to_string(payload) {
        Ok(json) => Bytes::from(format!("data: {}\n\n", json)),
        Err(e) => {
            tracing::error!("Failed to serialize SSE payload: {}", e);
            Bytes::new()
        },
    }
}

/// Error frame written when a stream fails before any content.
pub fn error_frame(error: &ProxyError) -> Bytes {
    sse_frame(&ErrorEnvelope::from(error))
}

pub fn done_frame() -> Bytes {
    Bytes::from_static(DONE_FRAME)
}
