use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document stored under a caller-chosen id (the source file name for ingested rules).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn new(id: String, document: String, embedding: Vec<f32>) -> Self {
        Self {
            id,
            document,
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// Result of a `get` call. Only ids present in the collection are returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetResult {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
}

/// Nearest neighbours of one query embedding, closest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    /// Cosine distance, `1 - cosine_similarity`.
    pub distances: Vec<f32>,
}

impl QueryResult {
    pub fn push(&mut self, id: String, document: String, distance: f32) {
        self.ids.push(id);
        self.documents.push(document);
        self.distances.push(distance);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
