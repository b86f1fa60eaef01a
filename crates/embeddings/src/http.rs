use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/embeddings".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HttpEmbeddingClient {
    config: HttpEmbeddingConfig,
    client: Client,
}

impl HttpEmbeddingClient {
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpEmbeddingConfig {
        &self.config
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.try_embed(&texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    warn!("Embedding request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_millis(1000 * (2_u64.pow(attempt)));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Embedding request was not attempted")))
    }

    async fn try_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to embedding endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Embedding endpoint returned error {}: {}",
                status,
                error_text
            ));
        }

        let mut embed_response: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        if embed_response.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Embedding endpoint returned {} vectors for {} inputs",
                embed_response.data.len(),
                texts.len()
            ));
        }

        embed_response.data.sort_by_key(|item| item.index);
        Ok(embed_response
            .data
            .into_iter()
            .map(|item| item.embedding)
            .collect())
    }
}
