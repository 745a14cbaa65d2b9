pub mod thread_request;
pub mod translator;

pub use thread_request::{build_image_request, build_thread_request};
pub use translator::{translate_events, NormalizedEvent};
