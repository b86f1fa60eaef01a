pub mod errors;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod service;

pub use errors::ApiError;
pub use ingest::{ingest_directory, IngestSummary};
pub use routes::create_app;
pub use service::ComplianceService;

use compliance_core::Config;
use log::warn;
use tracing_subscriber::EnvFilter;

/// Log filter from `RUST_LOG`, `info` when unset.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// `CONFIG_PATH` (default `./config.toml`) with environment overrides,
/// development defaults when the file cannot be loaded.
pub fn load_config() -> Config {
    let config = Config::load_from_env().unwrap_or_else(|e| {
        warn!("Could not load config ({:#}), using development defaults", e);
        Config::development()
    });
    config.with_env_overrides()
}
