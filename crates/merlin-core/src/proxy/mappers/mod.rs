// Protocol mappers: vendor request/event shapes on one side, OpenAI on the other.

pub mod merlin;
pub mod openai;

pub use merlin::{translate_events, NormalizedEvent};
