//! Streaming emitter: normalized events to OpenAI `chat.completion.chunk` SSE.
//!
//! ```text
//! Opened --ContentDelta--> Emitting --ContentDelta--> Emitting
//!   |                        |
//!   +--Done/Error--> Closed <+--Done/Error
//! ```
//!
//! Every frame is yielded as its own body chunk so hyper flushes it
//! immediately. An `Error` before any content writes an error frame and no
//! `[DONE]`; after content the stream is closed cleanly with a stop chunk.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::convert::Infallible;

use super::stream_formatters::{done_frame, error_frame, sse_frame, ChunkContext};
use crate::proxy::mappers::merlin::NormalizedEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Opened,
    Emitting,
    Closed,
}

pub struct StreamingEmitter {
    ctx: ChunkContext,
    state: EmitterState,
}

impl StreamingEmitter {
    pub fn new(ctx: ChunkContext) -> Self {
        Self { ctx, state: EmitterState::Opened }
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    /// Role-only opening chunk.
    pub fn open(&self) -> Bytes {
        sse_frame(&self.ctx.role_chunk())
    }

    /// Frames to write for `event`. Nothing is written once closed.
    pub fn on_event(&mut self, event: NormalizedEvent) -> Vec<Bytes> {
        if self.state == EmitterState::Closed {
            return Vec::new();
        }

        match event {
            NormalizedEvent::ContentDelta(text) => {
                self.state = EmitterState::Emitting;
                vec![sse_frame(&self.ctx.content_chunk(&text))]
            },
            NormalizedEvent::ImageReady(url) => {
                tracing::debug!("Ignoring image attachment in chat stream: {}", url);
                Vec::new()
            },
            NormalizedEvent::Done => self.close(),
            NormalizedEvent::Error(error) => {
                if self.state == EmitterState::Emitting {
                    tracing::warn!("Stream failed after content, closing cleanly: {}", error);
                    self.close()
                } else {
                    tracing::error!("Stream failed before content: {}", error);
                    self.state = EmitterState::Closed;
                    vec![error_frame(&error)]
                }
            },
        }
    }

    fn close(&mut self) -> Vec<Bytes> {
        self.state = EmitterState::Closed;
        vec![sse_frame(&self.ctx.stop_chunk()), done_frame()]
    }
}

/// Drive `events` through a [`StreamingEmitter`], producing SSE body chunks.
pub fn stream_chat_response<S>(
    ctx: ChunkContext,
    events: S,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = NormalizedEvent> + Send + 'static,
{
    async_stream::stream! {
        let mut emitter = StreamingEmitter::new(ctx);
        yield Ok(emitter.open());

        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            for frame in emitter.on_event(event) {
                yield Ok(frame);
            }
            if emitter.state() == EmitterState::Closed {
                break;
            }
        }

        // Event streams always end with a terminal event; guard anyway
        if emitter.state() != EmitterState::Closed {
            for frame in emitter.on_event(NormalizedEvent::Done) {
                yield Ok(frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use merlin_types::error::{CredentialError, ProxyError, UpstreamStreamError};
    use merlin_types::protocol::openai::ChatCompletionChunk;

    fn delta(text: &str) -> NormalizedEvent {
        NormalizedEvent::ContentDelta(text.to_string())
    }

    async fn run(events: Vec<NormalizedEvent>) -> Vec<String> {
        let body = stream_chat_response(ChunkContext::new("gpt-4o"), stream::iter(events));
        body.map(|frame| String::from_utf8(frame.unwrap().to_vec()).unwrap()).collect().await
    }

    fn parse_chunk(frame: &str) -> ChatCompletionChunk {
        let json = frame.strip_prefix("data: ").unwrap().trim_end();
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_ordered_deltas_then_stop_and_done() {
        let frames = run(vec![delta("A"), delta("B"), delta("C"), NormalizedEvent::Done]).await;

        assert_eq!(frames.len(), 6);
        let role = parse_chunk(&frames[0]);
        assert_eq!(role.choices[0].delta.role.as_deref(), Some("assistant"));
        assert!(role.choices[0].delta.content.is_none());

        let contents: Vec<String> = frames[1..4]
            .iter()
            .map(|f| parse_chunk(f).choices[0].delta.content.clone().unwrap())
            .collect();
        assert_eq!(contents, vec!["A", "B", "C"]);

        assert_eq!(parse_chunk(&frames[4]).choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(frames[5], "data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn test_error_before_content_has_no_done() {
        let error = ProxyError::Credential(CredentialError::NoSecret);
        let frames = run(vec![NormalizedEvent::Error(error)]).await;

        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains("no_credential_configured"));
        assert!(frames.iter().all(|f| !f.contains("[DONE]")));
    }

    #[tokio::test]
    async fn test_error_after_content_closes_cleanly() {
        let error = ProxyError::Upstream(UpstreamStreamError::TransportInterrupted {
            message: "reset".to_string(),
        });
        let frames = run(vec![delta("partial"), NormalizedEvent::Error(error)]).await;

        assert_eq!(frames.len(), 4);
        assert_eq!(parse_chunk(&frames[2]).choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(frames[3], "data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn test_nothing_written_after_close() {
        let frames = run(vec![delta("A"), NormalizedEvent::Done, delta("late")]).await;
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| !f.contains("late")));
    }

    #[tokio::test]
    async fn test_unterminated_event_stream_still_closes() {
        let frames = run(vec![delta("A")]).await;
        assert_eq!(frames.last().map(String::as_str), Some("data: [DONE]\n\n"));
    }

    #[test]
    fn test_state_transitions() {
        let mut emitter = StreamingEmitter::new(ChunkContext::new("m"));
        assert_eq!(emitter.state(), EmitterState::Opened);
        emitter.on_event(delta("x"));
        assert_eq!(emitter.state(), EmitterState::Emitting);
        emitter.on_event(NormalizedEvent::Done);
        assert_eq!(emitter.state(), EmitterState::Closed);
        assert!(emitter.on_event(delta("y")).is_empty());
    }
}
