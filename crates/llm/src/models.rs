use compliance_core::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "amethyst-13b-mistral".to_string(),
            timeout_secs: 300,
            max_retries: 1,
        }
    }
}

impl From<&compliance_core::config::LlmConfig> for ModelConfig {
    fn from(cfg: &compliance_core::config::LlmConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            timeout_secs: cfg.timeout_secs,
            max_retries: cfg.max_retries,
        }
    }
}

/// Sampling settings sent with a single completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    /// `-1` lets the server generate until the model stops.
    pub max_tokens: i32,
}

impl CompletionParams {
    pub const FIELD_EXTRACTION: Self = Self {
        temperature: 0.2,
        max_tokens: 1024,
    };
    pub const EMPLOYEE_COUNT: Self = Self {
        temperature: 0.2,
        max_tokens: 256,
    };
    pub const DETAILED_REPORT: Self = Self {
        temperature: 0.2,
        max_tokens: 512,
    };
    pub const CONVERSATION: Self = Self {
        temperature: 0.7,
        max_tokens: -1,
    };
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: &str, messages: Vec<ChatMessage>, params: CompletionParams) -> Self {
        Self {
            model: model.to_string(),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_core::Role;

    #[test]
    fn should_create_role_messages() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
    }

    #[test]
    fn should_convert_core_message() {
        let message = Message {
            role: Role::Assistant,
            content: "Approve".to_string(),
        };
        let chat: ChatMessage = message.into();

        assert_eq!(chat, ChatMessage::assistant("Approve"));
    }

    #[test]
    fn should_create_default_model_config() {
        let config = ModelConfig::default();
        assert_eq!(config.endpoint, "http://localhost:1234/v1/chat/completions");
        assert_eq!(config.model, "amethyst-13b-mistral");
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn should_serialize_completion_request_payload() {
        let request = ChatCompletionRequest::new(
            "amethyst-13b-mistral",
            vec![ChatMessage::user("Hello")],
            CompletionParams::CONVERSATION,
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "amethyst-13b-mistral");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert_eq!(json["max_tokens"], -1);
        assert_eq!(json["stream"], false);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn should_extract_first_choice_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}},{"message":{"content":"second"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.into_content().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn should_return_none_without_choices() {
        let response: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_content().is_none());
    }
}
