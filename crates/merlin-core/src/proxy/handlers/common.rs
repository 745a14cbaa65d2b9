use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use merlin_types::error::ProxyError;
use serde_json::{json, Value};

use super::error_response::ApiError;
use super::openai::handle_chat_completions;
use crate::proxy::server::AppState;

const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";

/// Fixed liveness body.
pub async fn handle_liveness() -> Json<Value> {
    Json(json!({
        "status": "GetMerlin2Api Service Running...",
        "message": "MoLoveSze..."
    }))
}

/// Bare 200 for non-preflight `OPTIONS`.
pub async fn handle_options() -> StatusCode {
    StatusCode::OK
}

pub async fn handle_method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError(ProxyError::MethodNotAllowed { method: method.to_string(), path: uri.path().to_string() })
}

/// Router fallback: any path ending in `/chat/completions` is a chat
/// endpoint, everything else answers with the liveness body.
pub async fn handle_fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    if !uri.path().ends_with(CHAT_COMPLETIONS_SUFFIX) {
        return handle_liveness().await.into_response();
    }

    match method {
        Method::POST => match handle_chat_completions(State(state), body).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        },
        Method::OPTIONS => handle_options().await.into_response(),
        _ => handle_method_not_allowed(method, uri).await.into_response(),
    }
}
