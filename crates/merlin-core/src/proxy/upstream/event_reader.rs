//! Pull-based decoder for vendor SSE bodies.
//!
//! [`EventSource::next`] yields one [`VendorEvent`] per significant `data:`
//! line. Bytes are buffered in a `BytesMut` and split on `\n`, so records may
//! arrive fragmented across network chunks. Malformed JSON records are logged
//! and skipped.

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use merlin_types::error::UpstreamStreamError;
use merlin_types::protocol::merlin::{RecordAttachment, StreamRecord};
use std::fmt::Display;
use std::time::Duration;

use crate::proxy::common::sse_parser::{classify_sse_line, SseLine, DONE_SENTINEL};

const STATUS_SYSTEM: &str = "system";
const EVENT_TYPE_DONE: &str = "DONE";
const ATTACHMENT_IMAGE: &str = "IMAGE";
const MESSAGE_EVENT: &str = "message";

/// One decoded vendor record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorEvent {
    pub status: Option<String>,
    pub event_type: Option<String>,
    pub content: Option<String>,
    /// Image URLs in discovery order. `data.url` alone when present, otherwise
    /// `data.attachments`, `data.message.attachments`, then `data.payload[].variations[]`.
    pub image_urls: Vec<String>,
}

impl VendorEvent {
    pub fn is_system(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SYSTEM)
    }

    /// `status == "system" && eventType == "DONE"`
    pub fn is_done(&self) -> bool {
        self.is_system() && self.event_type.as_deref() == Some(EVENT_TYPE_DONE)
    }
}

fn image_attachment_urls(attachments: &[RecordAttachment]) -> impl Iterator<Item = String> + '_ {
    attachments
        .iter()
        .filter(|a| a.kind == ATTACHMENT_IMAGE && !a.url.is_empty())
        .map(|a| a.url.clone())
}

impl From<StreamRecord> for VendorEvent {
    fn from(record: StreamRecord) -> Self {
        let Some(data) = record.data else {
            return Self { status: record.status, ..Self::default() };
        };

        // A direct `data.url` is the final asset; attachments in the same record repeat it
        let image_urls = match data.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => vec![url.to_string()],
            None => {
                let mut urls: Vec<String> = image_attachment_urls(&data.attachments).collect();
                if let Some(message) = &data.message {
                    urls.extend(image_attachment_urls(&message.attachments));
                }
                urls.extend(
                    data.payload
                        .iter()
                        .flat_map(|p| p.variations.iter())
                        .filter(|v| !v.url.is_empty())
                        .map(|v| v.url.clone()),
                );
                urls
            },
        };

        Self { status: record.status, event_type: data.event_type, content: data.content, image_urls }
    }
}

enum LineOutcome {
    Event(VendorEvent),
    Done,
    Skip,
}

/// Line-oriented reader over an upstream response body.
pub struct EventSource {
    body: BoxStream<'static, Result<Bytes, String>>,
    buffer: BytesMut,
    /// Name from the most recent `event:` line of the current record
    current_event: Option<String>,
    idle_timeout: Option<Duration>,
    finished: bool,
    skipped_records: usize,
}

impl EventSource {
    /// Wrap any byte stream; errors are kept only as their display text.
    pub fn new<S, E>(body: S, idle_timeout: Option<Duration>) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Display,
    {
        Self {
            body: body.map(|chunk| chunk.map_err(|e| e.to_string())).boxed(),
            buffer: BytesMut::new(),
            current_event: None,
            idle_timeout,
            finished: false,
            skipped_records: 0,
        }
    }

    pub fn from_response(response: reqwest::Response, idle_timeout: Option<Duration>) -> Self {
        Self::new(response.bytes_stream(), idle_timeout)
    }

    /// Records dropped because their JSON did not decode.
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Next vendor event, `Ok(None)` once the stream is done.
    ///
    /// Done means end of body, a `system`/`DONE` record, or a `[DONE]`
    /// sentinel. A transport error or idle timeout ends the source.
    pub async fn next(&mut self) -> Result<Option<VendorEvent>, UpstreamStreamError> {
        loop {
            if self.finished {
                return Ok(None);
            }

            while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line_raw = self.buffer.split_to(pos + 1);
                let line = String::from_utf8_lossy(&line_raw);
                match self.process_line(&line) {
                    LineOutcome::Event(event) => return Ok(Some(event)),
                    LineOutcome::Done => {
                        self.finished = true;
                        return Ok(None);
                    },
                    LineOutcome::Skip => {},
                }
            }

            match self.next_chunk().await {
                Ok(Some(bytes)) => self.buffer.extend_from_slice(&bytes),
                Ok(None) => {
                    self.finished = true;
                    // A final record may lack its trailing newline
                    if !self.buffer.is_empty() {
                        let rest = self.buffer.split();
                        let line = String::from_utf8_lossy(&rest);
                        if let LineOutcome::Event(event) = self.process_line(&line) {
                            return Ok(Some(event));
                        }
                    }
                    return Ok(None);
                },
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                },
            }
        }
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, UpstreamStreamError> {
        let chunk = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.body.next())
                .await
                .map_err(|_| UpstreamStreamError::IdleTimeout { secs: limit.as_secs() })?,
            None => self.body.next().await,
        };

        match chunk {
            Some(Ok(bytes)) => Ok(Some(bytes)),
            Some(Err(message)) => Err(UpstreamStreamError::TransportInterrupted { message }),
            None => Ok(None),
        }
    }

    fn process_line(&mut self, line: &str) -> LineOutcome {
        match classify_sse_line(line) {
            SseLine::Blank => {
                self.current_event = None;
                LineOutcome::Skip
            },
            SseLine::Event(name) => {
                self.current_event = Some(name.to_string());
                LineOutcome::Skip
            },
            SseLine::Ignored => LineOutcome::Skip,
            SseLine::Data(payload) => {
                if let Some(name) = self.current_event.as_deref() {
                    if name != MESSAGE_EVENT {
                        tracing::debug!("Ignoring data for SSE event '{}'", name);
                        return LineOutcome::Skip;
                    }
                }
                self.decode_payload(payload)
            },
        }
    }

    fn decode_payload(&mut self, payload: &str) -> LineOutcome {
        if payload == DONE_SENTINEL {
            return LineOutcome::Done;
        }
        if payload.is_empty() {
            return LineOutcome::Skip;
        }

        match serde_json::from_str::<StreamRecord>(payload) {
            Ok(record) => {
                let event = VendorEvent::from(record);
                if event.is_done() {
                    LineOutcome::Done
                } else {
                    LineOutcome::Event(event)
                }
            },
            Err(e) => {
                self.skipped_records += 1;
                let error = UpstreamStreamError::MalformedRecord { message: e.to_string() };
                tracing::warn!("Skipping upstream record: {}", error);
                LineOutcome::Skip
            },
        }
    }
}
