pub mod client;
pub mod error;
pub mod models;

pub use client::{parse_json_content, ChatModel, LocalLlmClient};
pub use error::LlmError;
pub use models::{ChatMessage, CompletionParams, ModelConfig};
