//! `POST /v1/images/generations`

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use merlin_types::error::ProxyError;
use merlin_types::protocol::openai::{ImageGenerationRequest, ImagesResponse};
use tracing::{debug, info};

use crate::proxy::handlers::error_response::{parse_json_body, ApiError};
use crate::proxy::image_generation::DEFAULT_IMAGE_MODEL;
use crate::proxy::server::AppState;

/// Only one URL is returned regardless of `n`; `size` is ignored in favour of
/// the configured aspect ratio.
pub async fn handle_images_generations(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImagesResponse>, ApiError> {
    let request: ImageGenerationRequest = parse_json_body(&body)?;

    if request.prompt.trim().is_empty() {
        return Err(ProxyError::invalid_request("prompt is required").into());
    }

    let model = request.model.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or(DEFAULT_IMAGE_MODEL);
    info!("Image request: model={}, n={:?}, size={:?}", model, request.n, request.size);

    let images = state.images.generate(&request.prompt, model).await?;
    debug!("Returning final URL out of {}", images.urls().len());

    Ok(Json(images.into_images_response()))
}
