pub mod collection;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod pg;
pub mod similarity;

pub use collection::Collection;
pub use memory::InMemoryCollection;
pub use migrations::run_migrations;
pub use models::{GetResult, QueryResult, StoredDocument};
pub use pg::PgVectorCollection;

use anyhow::Result;
use std::sync::Arc;

/// Opens the collection named by a store URL.
///
/// * `memory://` keeps documents in process memory only.
/// * `memory://<path>` also mirrors them to a JSON file.
/// * `postgres://…` / `postgresql://…` uses pgvector.
pub async fn open_collection(
    url: &str,
    name: &str,
    dimension: Option<usize>,
) -> Result<Arc<dyn Collection>> {
    if let Some(path) = url.strip_prefix("memory://") {
        if path.is_empty() {
            return Ok(Arc::new(InMemoryCollection::new(name, dimension)));
        }
        return Ok(Arc::new(InMemoryCollection::open(name, dimension, path).await?));
    }

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(Arc::new(
            PgVectorCollection::connect(url, name, dimension).await?,
        ));
    }

    anyhow::bail!("Unsupported vector store URL: {}", url)
}
