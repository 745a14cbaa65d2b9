// Request correlation identifiers. Opaque to this gateway, required by the vendor.

use uuid::Uuid;

/// Random identifier (message, child and parent ids).
pub fn generate_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Time-ordered identifier used for upstream chat ids.
pub fn generate_chat_id() -> String {
    Uuid::now_v7().to_string()
}

/// `chatcmpl-` prefixed id for OpenAI responses.
pub fn generate_completion_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4())
}
