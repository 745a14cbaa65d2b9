//! Vendor request bodies for the chat and image endpoints.

use merlin_types::models::{ChatDefaults, ImageDefaults};
use merlin_types::protocol::merlin::{
    ImageAction, ImageActionMessage, ImageMessageMetadata, ImageModelConfig, ImageSettings,
    ImageThreadRequest, ThreadMessage, ThreadMetadata, UnifiedThreadRequest,
};

use crate::proxy::common::random_id::{generate_chat_id, generate_message_id};

const UNIFIED_CHAT_MODE: &str = "UNIFIED_CHAT";
const IMAGE_CHAT_MODE: &str = "IMAGE_CHAT";
const ROOT_PARENT: &str = "root";
const NEW_ACTION: &str = "NEW";

/// Single-turn chat thread request. Only `prompt` is forwarded; prior turns are dropped.
pub fn build_thread_request(prompt: &str, model: &str, defaults: &ChatDefaults) -> UnifiedThreadRequest {
    let model = if model.trim().is_empty() { defaults.default_model.as_str() } else { model };

    UnifiedThreadRequest {
        attachments: Vec::new(),
        chat_id: generate_chat_id(),
        language: defaults.language.clone(),
        message: ThreadMessage {
            content: prompt.to_string(),
            context: String::new(),
            child_id: generate_message_id(),
            id: generate_message_id(),
            parent_id: ROOT_PARENT.to_string(),
        },
        metadata: ThreadMetadata {
            large_context: defaults.large_context,
            merlin_magic: defaults.merlin_magic,
            pro_finder_mode: defaults.pro_finder_mode,
            web_access: defaults.web_access,
        },
        mode: UNIFIED_CHAT_MODE.to_string(),
        model: model.to_string(),
    }
}

/// Image generation request for an already-resolved vendor model id.
pub fn build_image_request(prompt: &str, vendor_model: &str, defaults: &ImageDefaults) -> ImageThreadRequest {
    ImageThreadRequest {
        action: ImageAction {
            message: ImageActionMessage {
                attachments: Vec::new(),
                content: prompt.to_string(),
                metadata: ImageMessageMetadata::default(),
                parent_id: generate_message_id(),
                role: "user".to_string(),
            },
            action_type: NEW_ACTION.to_string(),
        },
        chat_id: generate_message_id(),
        mode: IMAGE_CHAT_MODE.to_string(),
        settings: ImageSettings {
            merlin_prompt_magic: false,
            model_config: vec![ImageModelConfig {
                aspect_ratio: defaults.aspect_ratio.clone(),
                model_id: vendor_model.to_string(),
                number_of_images: defaults.variations,
            }],
            negative_prompt: String::new(),
        },
    }
}
