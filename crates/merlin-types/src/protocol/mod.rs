//! Wire schemas.
//!
//! - `openai` - the inbound Chat Completions and Images API shapes
//! - `merlin` - one request/response schema per vendor endpoint

pub mod merlin;
pub mod openai;

pub use openai::{ChatCompletionRequest, ChatMessage, ImageGenerationRequest, MessageContent};
