pub mod fallback;
pub mod http;

pub use fallback::FallbackEmbeddingProvider;
pub use http::{HttpEmbeddingClient, HttpEmbeddingConfig};

use anyhow::Result;
use compliance_core::config::EmbeddingConfig;
use tracing::info;

type EmbedFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;

pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_>;
    fn dimension(&self) -> usize;
}

impl EmbeddingProvider for HttpEmbeddingClient {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.config().dimension
    }
}

impl EmbeddingProvider for FallbackEmbeddingProvider {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.embedding_dimension()
    }
}

pub fn create_embedding_provider(cfg: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let defaults = HttpEmbeddingConfig::default();
    let dimension = cfg.dimensions.unwrap_or(defaults.dimension);

    match cfg.provider.as_str() {
        "openai" | "http" => {
            let http_cfg = HttpEmbeddingConfig {
                endpoint: cfg.endpoint.clone().unwrap_or(defaults.endpoint),
                model: cfg.model.clone().unwrap_or(defaults.model),
                dimension,
                ..HttpEmbeddingConfig::default()
            };
            info!("Using HTTP embeddings at {}", http_cfg.endpoint);
            Ok(Box::new(HttpEmbeddingClient::new(http_cfg)?))
        }
        other => {
            info!("Using fallback embeddings for provider '{}'", other);
            Ok(Box::new(FallbackEmbeddingProvider::new(dimension)))
        }
    }
}
