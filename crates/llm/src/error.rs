use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Failed to connect to the language model: {0}")]
    Connection(String),

    #[error("Language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode language model response: {0}")]
    Decode(String),

    #[error("No valid JSON response from the language model")]
    EmptyResponse,

    #[error("Invalid JSON response from the language model: {0}")]
    InvalidJson(String),
}

impl LlmError {
    /// Connection failures and server-side errors may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_) => true,
            LlmError::Status { status, .. } => *status >= 500,
            LlmError::Decode(_) | LlmError::EmptyResponse | LlmError::InvalidJson(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_flag_retryable_errors() {
        assert!(LlmError::Connection("refused".to_string()).is_retryable());
        assert!(LlmError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!LlmError::EmptyResponse.is_retryable());
        assert!(!LlmError::InvalidJson("eof".to_string()).is_retryable());
    }

    #[test]
    fn should_format_messages() {
        assert_eq!(
            LlmError::EmptyResponse.to_string(),
            "No valid JSON response from the language model"
        );
        assert_eq!(
            LlmError::Status {
                status: 500,
                body: "boom".to_string()
            }
            .to_string(),
            "Language model returned HTTP 500: boom"
        );
    }
}
