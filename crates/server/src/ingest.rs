use anyhow::{Context, Result};
use documents::{extract_text, list_rule_documents, OcrEngine};
use embeddings::EmbeddingProvider;
use log::{info, warn};
use std::path::Path;
use vector_store::Collection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Documents with text, whether newly inserted or already stored.
    pub processed: usize,
    pub inserted: usize,
    pub total: usize,
}

/// Embeds every regulation document in `dir` into the collection, one
/// document per file with the file name as id.
pub async fn ingest_directory(
    dir: &Path,
    ocr: &dyn OcrEngine,
    embedder: &dyn EmbeddingProvider,
    collection: &dyn Collection,
) -> Result<IngestSummary> {
    let files = list_rule_documents(dir)?;
    let mut summary = IngestSummary {
        total: files.len(),
        ..IngestSummary::default()
    };

    if files.is_empty() {
        warn!("No valid documents found in {}", dir.display());
        return Ok(summary);
    }

    for path in files {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            warn!("Skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };
        info!("Processing: {}", file_name);

        let text = match extract_text(&path, ocr).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Error reading {}: {:#}", file_name, e);
                continue;
            }
        };
        if text.is_empty() {
            warn!("Skipping {}: no valid text found", file_name);
            continue;
        }

        let id = file_name.to_string();
        let existing = collection.get(std::slice::from_ref(&id)).await?;
        if !existing.ids.is_empty() {
            info!("Skipping {}: already stored", file_name);
            summary.processed += 1;
            continue;
        }

        let embedding = embedder
            .embed(vec![text.clone()])
            .await
            .with_context(|| format!("Failed to embed {}", file_name))?
            .into_iter()
            .next()
            .with_context(|| format!("No embedding generated for {}", file_name))?;

        summary.inserted += collection.add(vec![text], vec![embedding], vec![id]).await?;
        summary.processed += 1;
        info!("{} added to the collection", file_name);
    }

    info!(
        "{}/{} documents stored ({} new)",
        summary.processed, summary.total, summary.inserted
    );
    Ok(summary)
}
