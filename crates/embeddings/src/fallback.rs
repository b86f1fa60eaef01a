use anyhow::Result;

/// Offline embeddings provider producing hashed bag-of-words vectors.
/// Texts sharing words land close together, so retrieval still works in
/// development and tests when no embedding endpoint is available.
pub struct FallbackEmbeddingProvider {
    embedding_dim: usize,
}

impl FallbackEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim: embedding_dim.max(1),
        }
    }

    /// Same width as all-MiniLM-L6-v2 (384).
    pub fn with_standard_dimension() -> Self {
        Self::new(384)
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.embedding_dim];

        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.embedding_dim as u64) as usize;
            // One hash bit picks the sign to spread collisions around zero.
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }
        embedding
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
