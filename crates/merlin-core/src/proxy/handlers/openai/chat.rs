//! `POST /v1/chat/completions`

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{stream, Stream, StreamExt};
use merlin_types::error::ProxyError;
use merlin_types::protocol::merlin::UnifiedThreadRequest;
use merlin_types::protocol::openai::ChatCompletionRequest;
use std::convert::Infallible;
use tracing::{debug, info};

use crate::proxy::common::header_constants::{EVENT_STREAM, X_ACCEL_BUFFERING, X_MAPPED_MODEL};
use crate::proxy::handlers::error_response::{parse_json_body, ApiError};
use crate::proxy::image_generation::{is_image_model, resolve_vendor_model};
use crate::proxy::mappers::merlin::{build_thread_request, translate_events, NormalizedEvent};
use crate::proxy::mappers::openai::collector::build_completion;
use crate::proxy::mappers::openai::{collect_chat_response, stream_chat_response, ChunkContext};
use crate::proxy::server::AppState;
use crate::proxy::upstream::{is_auth_rejection, EventSource};

pub async fn handle_chat_completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ChatCompletionRequest = parse_json_body(&body)?;

    let Some(prompt) = request.last_message_text() else {
        return Err(ProxyError::invalid_request("messages must contain at least one message").into());
    };

    let model = if request.model.trim().is_empty() {
        state.config.chat.default_model.clone()
    } else {
        request.model.clone()
    };

    info!(
        "Chat request: model={}, stream={}, messages={}",
        model,
        request.stream,
        request.messages.len()
    );

    if is_image_model(&model) {
        return image_chat_response(&state, &prompt, &model, request.stream).await;
    }

    let ctx = ChunkContext::new(model.clone());
    let thread = build_thread_request(&prompt, &model, &state.config.chat);
    let events = chat_events(state, thread);

    if request.stream {
        return Ok(sse_response(stream_chat_response(ctx, events), &model));
    }

    let completion = collect_chat_response(&ctx, events).await?;
    let chars = completion.choices.first().map_or(0, |choice| choice.message.content.len());
    debug!("Aggregated {} chars over {} choice(s) for {}", chars, completion.choices.len(), completion.id);
    Ok(Json(completion).into_response())
}

async fn open_chat_source(state: &AppState, thread: &UnifiedThreadRequest) -> Result<EventSource, ProxyError> {
    let credential = state.chat_credentials.get_credential().await?;
    state.upstream.open_chat_stream(thread, &credential).await.map_err(|e| {
        if is_auth_rejection(&e) {
            state.chat_credentials.invalidate();
        }
        ProxyError::Upstream(e)
    })
}

/// Credential + upstream stream + translation, with setup failures folded
/// into the event stream as its single terminal `Error`.
fn chat_events(state: AppState, thread: UnifiedThreadRequest) -> impl Stream<Item = NormalizedEvent> + Send {
    async_stream::stream! {
        match open_chat_source(&state, &thread).await {
            Ok(source) => {
                let mut events = Box::pin(translate_events(source));
                while let Some(event) = events.next().await {
                    yield event;
                }
            },
            Err(e) => yield NormalizedEvent::Error(e),
        }
    }
}

/// Chat requests naming an image model: generate first, then answer with
/// markdown image links in the requested chat shape.
async fn image_chat_response(
    state: &AppState,
    prompt: &str,
    model: &str,
    streaming: bool,
) -> Result<Response, ApiError> {
    info!("Redirecting chat request for {} to image generation", model);
    let images = state.images.generate(prompt, model).await?;
    let markdown = images.markdown();
    let ctx = ChunkContext::new(model.to_string());

    if !streaming {
        return Ok(Json(build_completion(&ctx, markdown)).into_response());
    }

    let mut events = Vec::with_capacity(3);
    if let Some(progress) = state.images.defaults().progress_message.clone() {
        events.push(NormalizedEvent::ContentDelta(progress));
    }
    events.push(NormalizedEvent::ContentDelta(markdown));
    events.push(NormalizedEvent::Done);

    Ok(sse_response(stream_chat_response(ctx, stream::iter(events)), &resolve_vendor_model(model)))
}

fn sse_response<S>(body: S, mapped_model: &str) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    Response::builder()
        .header(header::CONTENT_TYPE, EVENT_STREAM)
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header(X_ACCEL_BUFFERING, "no")
        .header(X_MAPPED_MODEL, mapped_model)
        .body(Body::from_stream(body))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build SSE response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}
