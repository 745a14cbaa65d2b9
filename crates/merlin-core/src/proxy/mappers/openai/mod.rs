pub mod collector;
pub mod stream_formatters;
pub mod streaming;

pub use collector::collect_chat_response;
pub use stream_formatters::ChunkContext;
pub use streaming::{stream_chat_response, EmitterState, StreamingEmitter};
