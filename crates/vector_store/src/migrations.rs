use anyhow::{Context, Result};
use std::time::Duration;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("./migrations");
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

async fn connect(database_url: &str) -> Result<Client> {
    let (client, connection) =
        tokio::time::timeout(CONNECT_TIMEOUT, tokio_postgres::connect(database_url, NoTls))
            .await
            .context("Database connection timed out")?
            .context("Failed to connect to database")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Migration connection error: {}", e);
        }
    });

    Ok(client)
}

/// Applies the embedded schema migrations and returns the versions applied by this call.
pub async fn run_migrations(database_url: &str) -> Result<Vec<i32>> {
    info!("Running vector store migrations");
    let mut client = connect(database_url).await?;

    let report = embedded::migrations::runner()
        .run_async(&mut client)
        .await
        .context("Failed to run migrations")?;

    let applied: Vec<i32> = report
        .applied_migrations()
        .iter()
        .map(|migration| migration.version() as i32)
        .collect();
    for version in &applied {
        info!("Applied migration version {}", version);
    }

    Ok(applied)
}
