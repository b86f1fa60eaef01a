use crate::models::{GetResult, QueryResult};
use anyhow::Result;
use async_trait::async_trait;

/// A named set of embedded documents.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Adds documents under the given ids. Ids already present are skipped.
    /// Returns how many documents were inserted.
    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        ids: Vec<String>,
    ) -> Result<usize>;

    /// Stored ids in request order. Unknown ids are left out; a repeated id is
    /// returned every time it is asked for.
    async fn get(&self, ids: &[String]) -> Result<GetResult>;

    /// Returns up to `n_results` nearest documents for each query embedding.
    async fn query(&self, query_embeddings: &[Vec<f32>], n_results: usize)
        -> Result<Vec<QueryResult>>;

    async fn count(&self) -> Result<usize>;
}

/// Checks the parallel argument lists of `add` and the embedding widths.
pub(crate) fn validate_add(
    documents: &[String],
    embeddings: &[Vec<f32>],
    ids: &[String],
    dimension: Option<usize>,
) -> Result<()> {
    if documents.len() != embeddings.len() || documents.len() != ids.len() {
        anyhow::bail!(
            "Mismatched add arguments: {} documents, {} embeddings, {} ids",
            documents.len(),
            embeddings.len(),
            ids.len()
        );
    }

    if let Some(expected) = dimension {
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                expected,
                bad.len()
            );
        }
    }

    Ok(())
}

pub(crate) fn validate_query(query_embeddings: &[Vec<f32>], dimension: Option<usize>) -> Result<()> {
    if let Some(expected) = dimension {
        if let Some(bad) = query_embeddings.iter().find(|e| e.len() != expected) {
            anyhow::bail!(
                "Query embedding dimension mismatch: expected {}, got {}",
                expected,
                bad.len()
            );
        }
    }
    Ok(())
}
