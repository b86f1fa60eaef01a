use anyhow::Context;
use log::{error, info, warn};
use server::{create_app, init_logging, load_config, ComplianceService};
use std::sync::Arc;
use std::time::Duration;

const SESSION_GC_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    info!("Starting compliance server");

    let config = load_config();
    let bind_address = config.server.bind_address.clone();

    let service = Arc::new(
        ComplianceService::new(config)
            .await
            .context("Failed to initialize compliance service")?,
    );
    info!("Compliance service initialized: {:?}", service);

    info!("Loading documents from {}", service.config().data.document_dir);
    match service.ingest_documents().await {
        Ok(summary) => info!(
            "{}/{} documents stored ({} new)",
            summary.processed, summary.total, summary.inserted
        ),
        Err(e) => {
            error!("Failed to load documents: {:#}", e);
            warn!("Server will continue without pre-loaded documents");
        }
    }

    let gc_service = service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_GC_INTERVAL);
        loop {
            interval.tick().await;
            let removed = gc_service.gc_sessions().await;
            if removed > 0 {
                info!("Expired {} idle analysis sessions", removed);
            }
        }
    });

    let app = create_app(service);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    info!("Server running on http://{}", bind_address);
    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
