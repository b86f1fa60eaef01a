use crate::collection::{validate_add, validate_query, Collection};
use crate::migrations::run_migrations;
use crate::models::{GetResult, QueryResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tracing::{debug, info};

/// Collection stored in PostgreSQL with the pgvector extension.
pub struct PgVectorCollection {
    pool: PgPool,
    name: String,
    dimension: Option<usize>,
}

impl PgVectorCollection {
    pub async fn connect(
        database_url: &str,
        name: impl Into<String>,
        dimension: Option<usize>,
    ) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        run_migrations(database_url)
            .await
            .context("Failed to run database migrations")?;

        let name = name.into();
        info!("Vector collection '{}' ready on PostgreSQL", name);

        Ok(Self {
            pool,
            name,
            dimension,
        })
    }

    pub async fn delete_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM collection_documents WHERE collection = $1")
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .context("Failed to delete collection documents")?;
        Ok(())
    }
}

#[async_trait]
impl Collection for PgVectorCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        ids: Vec<String>,
    ) -> Result<usize> {
        validate_add(&documents, &embeddings, &ids, self.dimension)?;

        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;
        let mut inserted = 0;

        for ((document, embedding), id) in documents.into_iter().zip(embeddings).zip(ids) {
            let result = sqlx::query(
                r#"
                INSERT INTO collection_documents (collection, id, document, embedding)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (collection, id) DO NOTHING
                "#,
            )
            .bind(&self.name)
            .bind(&id)
            .bind(&document)
            .bind(Vector::from(embedding))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert document {}", id))?;

            if result.rows_affected() == 0 {
                debug!("Document {} already exists in '{}', skipping", id, self.name);
            } else {
                inserted += 1;
            }
        }

        tx.commit().await.context("Failed to commit documents")?;
        Ok(inserted)
    }

    async fn get(&self, ids: &[String]) -> Result<GetResult> {
        let rows = sqlx::query(
            "SELECT id, document FROM collection_documents WHERE collection = $1 AND id = ANY($2)",
        )
        .bind(&self.name)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch documents")?;

        let found: HashMap<String, String> = rows
            .iter()
            .map(|row| (row.get("id"), row.get("document")))
            .collect();

        let mut result = GetResult::default();
        for id in ids {
            if let Some(document) = found.get(id) {
                result.ids.push(id.clone());
                result.documents.push(document.clone());
            }
        }
        Ok(result)
    }

    async fn query(
        &self,
        query_embeddings: &[Vec<f32>],
        n_results: usize,
    ) -> Result<Vec<QueryResult>> {
        validate_query(query_embeddings, self.dimension)?;

        let mut results = Vec::with_capacity(query_embeddings.len());
        for embedding in query_embeddings {
            let mut result = QueryResult::default();
            if n_results > 0 {
                let rows = sqlx::query(
                    r#"
                    SELECT id, document, (embedding <=> $1) AS distance
                    FROM collection_documents
                    WHERE collection = $2
                    ORDER BY embedding <=> $1
                    LIMIT $3
                    "#,
                )
                .bind(Vector::from(embedding.clone()))
                .bind(&self.name)
                .bind(n_results as i64)
                .fetch_all(&self.pool)
                .await
                .context("Failed to execute similarity search")?;

                for row in &rows {
                    let distance: f64 = row.get("distance");
                    result.push(row.get("id"), row.get("document"), distance as f32);
                }
            }
            debug!("Similarity search returned {} results", result.len());
            results.push(result);
        }

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM collection_documents WHERE collection = $1")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to get document count")?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
