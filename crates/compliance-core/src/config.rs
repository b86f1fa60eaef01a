use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub session_ttl_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            session_ttl_seconds: 3600,
        }
    }
}

impl ServerConfig {
    pub fn with_env_overrides(&self) -> Self {
        let bind_address =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| self.bind_address.clone());
        Self {
            bind_address,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_llm_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    1
}

impl LlmConfig {
    pub fn with_env_overrides(&self) -> Self {
        let endpoint = env::var("LLM_ENDPOINT").unwrap_or_else(|_| self.endpoint.clone());
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| self.model.clone());
        Self {
            endpoint,
            model,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub dimensions: Option<usize>,
}

impl EmbeddingConfig {
    pub fn with_env_overrides(&self) -> Self {
        let endpoint = env::var("EMBEDDING_ENDPOINT")
            .ok()
            .or_else(|| self.endpoint.clone());
        Self {
            endpoint,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    "industrial-documents".to_string()
}

impl VectorStoreConfig {
    pub fn with_env_overrides(&self) -> Self {
        let url = env::var("VECTOR_STORE_URL").unwrap_or_else(|_| self.url.clone());
        Self {
            url,
            collection: self.collection.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            dpi: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub document_dir: String,
}

impl DataConfig {
    pub fn with_env_overrides(&self) -> Self {
        let document_dir =
            env::var("DOCUMENT_DIR").unwrap_or_else(|_| self.document_dir.clone());
        Self { document_dir }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub tolerance: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { tolerance: 5.0 }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| Self::default_config_path());
        Self::load(Path::new(&config_path))
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }

    /// Local defaults: LM Studio on port 1234, offline embeddings, file-backed collection.
    pub fn development() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig {
                endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
                model: "amethyst-13b-mistral".to_string(),
                timeout_secs: default_llm_timeout(),
                max_retries: default_max_retries(),
            },
            embedding: EmbeddingConfig {
                provider: "fallback".to_string(),
                endpoint: None,
                model: None,
                dimensions: Some(384),
            },
            vector_store: VectorStoreConfig {
                url: "memory://./db/industrial-documents.json".to_string(),
                collection: default_collection(),
            },
            ocr: OcrConfig::default(),
            data: DataConfig {
                document_dir: "./documents".to_string(),
            },
            verification: VerificationConfig::default(),
        }
    }

    /// Applies every section's environment overrides.
    pub fn with_env_overrides(&self) -> Self {
        Self {
            server: self.server.with_env_overrides(),
            llm: self.llm.with_env_overrides(),
            embedding: self.embedding.with_env_overrides(),
            vector_store: self.vector_store.with_env_overrides(),
            ocr: self.ocr.clone(),
            data: self.data.with_env_overrides(),
            verification: self.verification.clone(),
        }
    }
}
