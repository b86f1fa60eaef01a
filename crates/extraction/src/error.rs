use llm::LlmError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No text could be extracted from the document")]
    NoText,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Unexpected response structure: {0}")]
    Shape(String),
}

impl ExtractionError {
    /// The `{"error": message}` object returned to callers in place of a result.
    pub fn to_error_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}
