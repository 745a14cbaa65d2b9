//! Image generation: credential → generation request → vendor stream →
//! ordered URL list → Images API payload or chat markdown.
//!
//! Uses its own [`CredentialStore`] with an independent lease; the chat cache
//! is never consulted here.

pub mod model_table;

pub use model_table::{is_image_model, resolve_vendor_model, DEFAULT_IMAGE_MODEL};

use futures::StreamExt;
use merlin_types::error::ProxyError;
use merlin_types::models::ImageDefaults;
use merlin_types::protocol::openai::{ImageData, ImagesResponse};
use std::sync::Arc;

use crate::proxy::credential::CredentialStore;
use crate::proxy::mappers::merlin::{build_image_request, translate_events, NormalizedEvent};
use crate::proxy::upstream::{is_auth_rejection, UpstreamClient};

/// Number of images embedded in a chat response.
const CHAT_EMBED_LIMIT: usize = 2;

/// Every URL one generation produced, in arrival order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImages {
    urls: Vec<String>,
}

impl GeneratedImages {
    pub fn new(urls: Vec<String>) -> Result<Self, ProxyError> {
        if urls.is_empty() {
            return Err(ProxyError::NoImageProduced);
        }
        Ok(Self { urls })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Images API path: the last URL is the final render.
    pub fn final_url(&self) -> &str {
        self.urls.last().map(String::as_str).unwrap_or_default()
    }

    /// Chat path: first two URLs as inline markdown images.
    pub fn markdown(&self) -> String {
        self.urls
            .iter()
            .take(CHAT_EMBED_LIMIT)
            .map(|url| format!("![Generated Image]({})", url))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_images_response(self) -> ImagesResponse {
        ImagesResponse {
            created: chrono::Utc::now().timestamp(),
            data: vec![ImageData { url: self.final_url().to_string() }],
        }
    }
}

#[derive(Clone)]
pub struct ImageOrchestrator {
    credentials: Arc<CredentialStore>,
    upstream: UpstreamClient,
    defaults: ImageDefaults,
}

impl ImageOrchestrator {
    pub fn new(credentials: Arc<CredentialStore>, upstream: UpstreamClient, defaults: ImageDefaults) -> Self {
        Self { credentials, upstream, defaults }
    }

    pub fn defaults(&self) -> &ImageDefaults {
        &self.defaults
    }

    /// Run one generation and collect every URL it produced.
    ///
    /// URLs seen before a mid-stream failure are kept; zero URLs is always an error.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<GeneratedImages, ProxyError> {
        let vendor_model = resolve_vendor_model(model);
        tracing::info!("Generating image with {} ({} chars prompt)", vendor_model, prompt.chars().count());

        let credential = self.credentials.get_credential().await?;
        let request = build_image_request(prompt, &vendor_model, &self.defaults);

        let source = match self.upstream.open_image_stream(&request, &credential).await {
            Ok(source) => source,
            Err(e) => {
                if is_auth_rejection(&e) {
                    self.credentials.invalidate();
                }
                return Err(e.into());
            },
        };

        let mut urls = Vec::new();
        let mut events = Box::pin(translate_events(source));
        while let Some(event) = events.next().await {
            match event {
                NormalizedEvent::ImageReady(url) => {
                    tracing::debug!("Image URL discovered: {}", url);
                    urls.push(url);
                },
                NormalizedEvent::ContentDelta(_) => {},
                NormalizedEvent::Done => break,
                NormalizedEvent::Error(error) => {
                    if urls.is_empty() {
                        return Err(error);
                    }
                    tracing::warn!("Image stream failed after {} URLs: {}", urls.len(), error);
                    break;
                },
            }
        }

        tracing::info!("Image generation finished with {} URLs", urls.len());
        GeneratedImages::new(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(urls: &[&str]) -> GeneratedImages {
        GeneratedImages::new(urls.iter().map(|u| (*u).to_string()).collect()).unwrap()
    }

    #[test]
    fn test_single_image_path_returns_last() {
        assert_eq!(images(&["u1", "u2", "u3"]).final_url(), "u3");
    }

    #[test]
    fn test_chat_path_embeds_first_two() {
        assert_eq!(
            images(&["u1", "u2", "u3"]).markdown(),
            "![Generated Image](u1)\n![Generated Image](u2)"
        );
        assert_eq!(images(&["only"]).markdown(), "![Generated Image](only)");
    }

    #[test]
    fn test_zero_urls_is_no_image_produced() {
        let err = GeneratedImages::new(Vec::new()).unwrap_err();
        assert_eq!(err, ProxyError::NoImageProduced);
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_images_response_single_entry() {
        let response = images(&["u1", "u2"]).into_images_response();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].url, "u2");
    }
}
