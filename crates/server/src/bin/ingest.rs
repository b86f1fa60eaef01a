use anyhow::Context;
use clap::Parser;
use documents::TesseractCli;
use embeddings::create_embedding_provider;
use server::{ingest_directory, init_logging, load_config};
use std::path::PathBuf;
use vector_store::open_collection;

/// Embeds regulation documents into the vector store collection.
#[derive(Parser, Debug)]
#[command(name = "ingest")]
struct Args {
    /// Documents directory, defaults to the configured one.
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config();

    let dir = args
        .dir
        .unwrap_or_else(|| PathBuf::from(&config.data.document_dir));
    if !dir.exists() {
        anyhow::bail!("Directory '{}' does not exist", dir.display());
    }

    let embedder = create_embedding_provider(&config.embedding)
        .context("Failed to create embedding provider")?;
    let collection = open_collection(
        &config.vector_store.url,
        &config.vector_store.collection,
        Some(embedder.dimension()),
    )
    .await
    .context("Failed to open vector store collection")?;
    let ocr = TesseractCli::new(&config.ocr);

    let summary = ingest_directory(&dir, &ocr, embedder.as_ref(), collection.as_ref()).await?;

    println!(
        "{}/{} documents stored successfully in '{}'",
        summary.processed,
        summary.total,
        collection.name()
    );
    Ok(())
}
