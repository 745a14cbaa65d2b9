use futures::{Stream, StreamExt};
use merlin_types::error::ProxyError;
use merlin_types::protocol::openai::{AssistantMessage, ChatCompletion, CompletionChoice};

use super::stream_formatters::{ChunkContext, ASSISTANT_ROLE, COMPLETION_OBJECT, FINISH_STOP};
use crate::proxy::mappers::merlin::NormalizedEvent;

/// Build a single `chat.completion` with `content` as the assistant message.
pub fn build_completion(ctx: &ChunkContext, content: String) -> ChatCompletion {
    ChatCompletion {
        id: ctx.id.clone(),
        object: COMPLETION_OBJECT.to_string(),
        created: ctx.created,
        model: ctx.model.clone(),
        choices: vec![CompletionChoice {
            index: 0,
            message: AssistantMessage { role: ASSISTANT_ROLE.to_string(), content },
            finish_reason: FINISH_STOP.to_string(),
        }],
    }
}

/// Aggregating emitter: concatenate every delta in arrival order.
///
/// An error before any content is returned as-is (5xx for the caller); after
/// content the partial text is returned, matching the streaming path.
pub async fn collect_chat_response<S>(ctx: &ChunkContext, events: S) -> Result<ChatCompletion, ProxyError>
where
    S: Stream<Item = NormalizedEvent>,
{
    let mut content = String::new();
    let mut events = Box::pin(events);

    while let Some(event) = events.next().await {
        match event {
            NormalizedEvent::ContentDelta(text) => content.push_str(&text),
            NormalizedEvent::ImageReady(url) => {
                tracing::debug!("Ignoring image attachment in chat response: {}", url);
            },
            NormalizedEvent::Done => break,
            NormalizedEvent::Error(error) => {
                if content.is_empty() {
                    return Err(error);
                }
                tracing::warn!("Returning partial completion after stream error: {}", error);
                break;
            },
        }
    }

    Ok(build_completion(ctx, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use merlin_types::error::UpstreamStreamError;

    fn delta(text: &str) -> NormalizedEvent {
        NormalizedEvent::ContentDelta(text.to_string())
    }

    #[tokio::test]
    async fn test_concatenates_in_order() {
        let ctx = ChunkContext::new("gpt-4o");
        let events = stream::iter(vec![delta("A"), delta("B"), delta("C"), NormalizedEvent::Done]);

        let completion = collect_chat_response(&ctx, events).await.unwrap();
        let value = serde_json::to_value(&completion).unwrap();

        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["choices"][0]["message"]["content"], "ABC");
        assert_eq!(value["choices"][0]["message"]["role"], "assistant");
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
    }

    #[tokio::test]
    async fn test_error_before_content_is_failure() {
        let ctx = ChunkContext::new("gpt-4o");
        let error = ProxyError::Upstream(UpstreamStreamError::ConnectFailed {
            status: Some(503),
            message: "unavailable".to_string(),
        });
        let events = stream::iter(vec![NormalizedEvent::Error(error.clone())]);

        let err = collect_chat_response(&ctx, events).await.unwrap_err();
        assert_eq!(err, error);
        assert!(err.http_status_code() >= 500);
    }

    #[tokio::test]
    async fn test_error_after_content_returns_partial() {
        let ctx = ChunkContext::new("gpt-4o");
        let error = ProxyError::Upstream(UpstreamStreamError::TransportInterrupted {
            message: "reset".to_string(),
        });
        let events = stream::iter(vec![delta("par"), delta("tial"), NormalizedEvent::Error(error)]);

        let completion = collect_chat_response(&ctx, events).await.unwrap();
        assert_eq!(completion.choices[0].message.content, "partial");
    }

    #[tokio::test]
    async fn test_empty_stream_still_yields_one_choice() {
        let ctx = ChunkContext::new("gpt-4o");
        let completion = collect_chat_response(&ctx, stream::iter(vec![NormalizedEvent::Done])).await.unwrap();

        assert_eq!(completion.choices.len(), 1);
        assert_eq!(completion.choices.first().map(|c| c.message.content.as_str()), Some(""));
    }
}
