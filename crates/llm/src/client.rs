use crate::error::LlmError;
use crate::models::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionParams, ModelConfig,
};
use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use serde_json::Value;
use std::time::Duration;

/// A chat-completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, LlmError>;

    /// Runs a completion whose content must be a single JSON document.
    async fn complete_json(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<Value, LlmError> {
        let content = self.complete(messages, params).await?;
        parse_json_content(&content)
    }
}

/// Parses model output as JSON. Surrounding whitespace and a markdown code
/// fence are tolerated.
pub fn parse_json_content(content: &str) -> Result<Value, LlmError> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    serde_json::from_str(trimmed).map_err(|e| LlmError::InvalidJson(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint such as LM Studio.
pub struct LocalLlmClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl LocalLlmClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        info!("Initializing LocalLlmClient for {}", config.endpoint);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    async fn try_complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        let request = ChatCompletionRequest::new(&self.config.model, messages, params);

        info!("Sending request to model: {}", self.config.model);
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("LLM send error: {:?}", e);
                LlmError::Connection(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        info!("Received response from model: {}", self.config.model);
        parsed.into_content().ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl ChatModel for LocalLlmClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        let mut attempt = 0;

        loop {
            match self.try_complete(messages.clone(), params).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!("LLM request failed (attempt {}): {}", attempt, e);
                    let delay = Duration::from_millis(1000 * (2_u64.pow(attempt - 1)));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
