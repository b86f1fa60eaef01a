use crate::collection::{validate_add, validate_query, Collection};
use crate::models::{GetResult, QueryResult, StoredDocument};
use crate::similarity::cosine_distance;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    name: String,
    documents: Vec<StoredDocument>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<StoredDocument>,
    index: HashMap<String, usize>,
}

impl Inner {
    fn from_documents(documents: Vec<StoredDocument>) -> Self {
        let mut inner = Inner::default();
        for doc in documents {
            if !inner.index.contains_key(&doc.id) {
                inner.index.insert(doc.id.clone(), inner.documents.len());
                inner.documents.push(doc);
            }
        }
        inner
    }

    fn dimension(&self) -> Option<usize> {
        self.documents.first().map(|doc| doc.embedding.len())
    }
}

/// Collection held in process memory, optionally mirrored to a JSON file.
pub struct InMemoryCollection {
    name: String,
    dimension: Option<usize>,
    path: Option<PathBuf>,
    inner: RwLock<Inner>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>, dimension: Option<usize>) -> Self {
        Self {
            name: name.into(),
            dimension,
            path: None,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Opens a collection persisted at `path`, loading it when the file exists.
    pub async fn open(
        name: impl Into<String>,
        dimension: Option<usize>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let name = name.into();
        let path = path.as_ref().to_path_buf();

        let documents = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read collection file {}", path.display()))?;
            let snapshot: Snapshot = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse collection file {}", path.display()))?;
            info!(
                "Loaded {} documents into collection '{}' from {}",
                snapshot.documents.len(),
                name,
                path.display()
            );
            snapshot.documents
        } else {
            Vec::new()
        };

        Ok(Self {
            name,
            dimension,
            path: Some(path),
            inner: RwLock::new(Inner::from_documents(documents)),
        })
    }

    async fn persist(&self, inner: &Inner) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let snapshot = Snapshot {
            name: self.name.clone(),
            documents: inner.documents.clone(),
        };
        let json = serde_json::to_string(&snapshot).context("Failed to serialize collection")?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        ids: Vec<String>,
    ) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let dimension = self.dimension.or_else(|| inner.dimension());
        validate_add(&documents, &embeddings, &ids, dimension)?;

        let mut inserted = 0;
        for ((document, embedding), id) in documents.into_iter().zip(embeddings).zip(ids) {
            if inner.index.contains_key(&id) {
                debug!("Document {} already exists in '{}', skipping", id, self.name);
                continue;
            }
            let position = inner.documents.len();
            inner.index.insert(id.clone(), position);
            inner
                .documents
                .push(StoredDocument::new(id, document, embedding));
            inserted += 1;
        }

        if inserted > 0 {
            self.persist(&inner).await?;
        }
        Ok(inserted)
    }

    async fn get(&self, ids: &[String]) -> Result<GetResult> {
        let inner = self.inner.read().await;
        let mut result = GetResult::default();
        for id in ids {
            if let Some(&position) = inner.index.get(id) {
                let doc = &inner.documents[position];
                result.ids.push(doc.id.clone());
                result.documents.push(doc.document.clone());
            }
        }
        Ok(result)
    }

    async fn query(
        &self,
        query_embeddings: &[Vec<f32>],
        n_results: usize,
    ) -> Result<Vec<QueryResult>> {
        let inner = self.inner.read().await;
        validate_query(query_embeddings, self.dimension.or_else(|| inner.dimension()))?;

        let results = query_embeddings
            .iter()
            .map(|query| {
                let mut scored: Vec<(f32, &StoredDocument)> = inner
                    .documents
                    .iter()
                    .map(|doc| (cosine_distance(query, &doc.embedding), doc))
                    .collect();
                scored.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut result = QueryResult::default();
                for (distance, doc) in scored.into_iter().take(n_results) {
                    result.push(doc.id.clone(), doc.document.clone(), distance);
                }
                result
            })
            .collect();

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.documents.len())
    }
}
