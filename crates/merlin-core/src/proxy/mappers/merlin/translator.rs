//! Vendor events to [`NormalizedEvent`]s.
//!
//! The produced stream is finite and always ends with exactly one `Done` or
//! `Error`. Dropping it drops the underlying [`EventSource`] and with it the
//! upstream connection.

use futures::Stream;
use merlin_types::error::ProxyError;

use crate::proxy::upstream::{EventSource, VendorEvent};

/// Heartbeat payloads the vendor sends between real deltas.
const NOOP_CONTENT: &[&str] = &["", " "];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    ContentDelta(String),
    ImageReady(String),
    Done,
    Error(ProxyError),
}

impl NormalizedEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}

/// Non-terminal events carried by one vendor record, in record order.
pub fn classify_event(event: VendorEvent) -> Vec<NormalizedEvent> {
    let mut out = Vec::with_capacity(1 + event.image_urls.len());

    if !event.is_system() {
        if let Some(content) = event.content {
            if !NOOP_CONTENT.contains(&content.as_str()) {
                out.push(NormalizedEvent::ContentDelta(content));
            }
        }
    }
    out.extend(event.image_urls.into_iter().map(NormalizedEvent::ImageReady));
    out
}

pub fn translate_events(mut source: EventSource) -> impl Stream<Item = NormalizedEvent> + Send {
    async_stream::stream! {
        loop {
            match source.next().await {
                Ok(Some(event)) => {
                    for normalized in classify_event(event) {
                        yield normalized;
                    }
                },
                Ok(None) => {
                    yield NormalizedEvent::Done;
                    break;
                },
                Err(e) => {
                    tracing::warn!("Upstream stream ended with error: {}", e);
                    yield NormalizedEvent::Error(ProxyError::Upstream(e));
                    break;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::{stream, StreamExt};
    use merlin_types::error::UpstreamStreamError;

    fn event(status: Option<&str>, content: &str) -> VendorEvent {
        VendorEvent {
            status: status.map(str::to_string),
            content: Some(content.to_string()),
            ..VendorEvent::default()
        }
    }

    async fn translate(chunks: Vec<Result<&'static str, &'static str>>) -> Vec<NormalizedEvent> {
        let body = stream::iter(chunks.into_iter().map(|c| c.map(Bytes::from)));
        translate_events(EventSource::new(body, None)).collect().await
    }

    #[test]
    fn test_noop_content_suppressed() {
        assert!(classify_event(event(None, "")).is_empty());
        assert!(classify_event(event(None, " ")).is_empty());
        assert_eq!(
            classify_event(event(None, "  ")),
            vec![NormalizedEvent::ContentDelta("  ".to_string())]
        );
    }

    #[test]
    fn test_system_content_skipped() {
        assert!(classify_event(event(Some("system"), "Thinking...")).is_empty());
        assert_eq!(
            classify_event(event(Some("message"), "Hi")),
            vec![NormalizedEvent::ContentDelta("Hi".to_string())]
        );
    }

    #[test]
    fn test_image_urls_become_image_ready() {
        let vendor = VendorEvent {
            image_urls: vec!["https://a".to_string(), "https://b".to_string()],
            ..VendorEvent::default()
        };
        assert_eq!(
            classify_event(vendor),
            vec![
                NormalizedEvent::ImageReady("https://a".to_string()),
                NormalizedEvent::ImageReady("https://b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_order_preserved_and_done_terminates() {
        let events = translate(vec![
            Ok("data: {\"data\":{\"content\":\"A\"}}\n\n"),
            Ok("data: {\"data\":{\"content\":\" \"}}\n\n"),
            Ok("data: {\"data\":{\"content\":\"B\"}}\n\ndata: {\"data\":{\"content\":\"C\"}}\n\n"),
            Ok("data: {\"status\":\"system\",\"data\":{\"eventType\":\"DONE\"}}\n\n"),
        ])
        .await;

        assert_eq!(
            events,
            vec![
                NormalizedEvent::ContentDelta("A".to_string()),
                NormalizedEvent::ContentDelta("B".to_string()),
                NormalizedEvent::ContentDelta("C".to_string()),
                NormalizedEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_single_terminal() {
        let events = translate(vec![
            Ok("data: {\"data\":{\"content\":\"A\"}}\n\n"),
            Err("connection reset"),
            Ok("data: {\"data\":{\"content\":\"never\"}}\n\n"),
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], NormalizedEvent::ContentDelta("A".to_string()));
        assert_eq!(
            events[1],
            NormalizedEvent::Error(ProxyError::Upstream(UpstreamStreamError::TransportInterrupted {
                message: "connection reset".to_string()
            }))
        );
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_record_between_valid_events() {
        let events = translate(vec![
            Ok("data: {\"data\":{\"content\":\"A\"}}\n\n"),
            Ok("data: {\"data\":\n\n"),
            Ok("data: {\"data\":{\"content\":\"B\"}}\n\n"),
        ])
        .await;

        assert_eq!(
            events,
            vec![
                NormalizedEvent::ContentDelta("A".to_string()),
                NormalizedEvent::ContentDelta("B".to_string()),
                NormalizedEvent::Done,
            ]
        );
    }
}
