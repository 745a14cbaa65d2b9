//! Fixed image model table. Names outside it pass through as vendor ids.

pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/flux-1.1-pro";

/// Caller-facing name → vendor model id.
const IMAGE_MODELS: &[(&str, &str)] = &[
    ("flux-1.1-pro", "black-forest-labs/flux-1.1-pro"),
    ("flux-schnell", "black-forest-labs/flux-schnell"),
    ("dall-e-3", "black-forest-labs/flux-1.1-pro"),
];

/// Marker that routes a chat request to image generation.
const CHAT_IMAGE_MARKER: &str = "flux-1.1-pro";

pub fn resolve_vendor_model(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_IMAGE_MODEL.to_string();
    }
    let lowered = trimmed.to_lowercase();
    IMAGE_MODELS
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, vendor)| (*vendor).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// True when a chat `model` should be served by the image orchestrator.
pub fn is_image_model(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() {
        return false;
    }
    lowered.contains(CHAT_IMAGE_MARKER)
        || IMAGE_MODELS.iter().any(|(alias, vendor)| *alias == lowered || *vendor == lowered)
}
