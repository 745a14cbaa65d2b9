// Handlers module - API endpoint handlers

pub mod common;
pub mod error_response;
pub mod openai;

pub use error_response::ApiError;
