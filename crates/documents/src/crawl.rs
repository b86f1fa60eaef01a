use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    pub title: String,
    pub text: String,
}

/// Page title (`"Untitled"` when absent) and the text of every `<p>`, one per line.
pub fn parse_html(html: &str) -> ScrapedPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>())
        })
        .unwrap_or_else(|| "Untitled".to_string());

    let text = Selector::parse("p")
        .map(|selector| {
            document
                .select(&selector)
                .map(|element| element.text().collect::<String>())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    ScrapedPage { title, text }
}

/// Replaces characters that are unsafe in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Option<Regex>> = OnceLock::new();
    match UNSAFE.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).ok()) {
        Some(pattern) => pattern.replace_all(name, "_").into_owned(),
        None => name.to_string(),
    }
}

/// `<host[:port]>_<sanitized title>.txt`, with runs of whitespace in the title
/// collapsed to a single space.
pub fn output_file_name(url: &Url, title: &str) -> String {
    let domain = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    sanitize_filename(&format!("{}_{}.txt", domain, title))
}

pub struct RegulationCrawler {
    client: reqwest::Client,
    output_dir: PathBuf,
}

impl RegulationCrawler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Error status from {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }

    /// Fetches one page and saves its paragraph text. Returns the written file.
    pub async fn crawl(&self, url: &str) -> Result<PathBuf> {
        let url = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        let html = self.fetch(&url).await?;
        let page = parse_html(&html);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        let path = self.output_dir.join(output_file_name(&url, &page.title));
        tokio::fs::write(&path, &page.text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Saved {} to {}", url, path.display());
        Ok(path)
    }

    /// Crawls every URL; failures are logged and skipped.
    pub async fn crawl_all(&self, urls: &[String]) -> Vec<PathBuf> {
        let mut saved = Vec::new();
        for url in urls {
            match self.crawl(url).await {
                Ok(path) => saved.push(path),
                Err(e) => warn!("Skipping {}: {:#}", url, e),
            }
        }
        saved
    }
}
