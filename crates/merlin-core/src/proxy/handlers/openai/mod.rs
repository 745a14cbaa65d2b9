// OpenAI handlers

mod chat;
mod images;

pub use chat::handle_chat_completions;
pub use images::handle_images_generations;
