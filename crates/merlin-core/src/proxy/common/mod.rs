pub mod client_builder;
pub mod error_body;
pub mod header_constants;
pub mod random_id;
pub mod sse_parser;

pub use sse_parser::{classify_sse_line, SseLine};
