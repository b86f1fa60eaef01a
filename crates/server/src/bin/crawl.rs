use clap::Parser;
use documents::RegulationCrawler;
use server::{init_logging, load_config};
use std::path::PathBuf;

const DEFAULT_SOURCES: [&str; 3] = [
    "https://www.comply4hr.com/docs/ker/kesoa/KESOAS1.htm",
    "https://en.wikipedia.org/wiki/Department_of_Industries_(Kerala)",
    "https://en.wikipedia.org/wiki/Kerala_State_Industrial_Development_Corporation",
];

/// Saves the paragraph text of regulation pages into the documents directory.
#[derive(Parser, Debug)]
#[command(name = "crawl")]
struct Args {
    /// Pages to fetch, defaults to the built-in regulation sources.
    urls: Vec<String>,

    /// Output directory, defaults to the configured documents directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config();

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&config.data.document_dir));
    let urls: Vec<String> = if args.urls.is_empty() {
        DEFAULT_SOURCES.iter().map(|url| url.to_string()).collect()
    } else {
        args.urls
    };

    let crawler = RegulationCrawler::new(out)?;
    let saved = crawler.crawl_all(&urls).await;
    for path in &saved {
        println!("Saved {}", path.display());
    }
    println!(
        "{}/{} pages saved to {}",
        saved.len(),
        urls.len(),
        crawler.output_dir().display()
    );
    Ok(())
}
