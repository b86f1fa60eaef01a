use anyhow::Context;
use clap::Parser;
use extraction::IndustrialApplication;
use server::{init_logging, load_config, ComplianceService};
use std::path::PathBuf;

/// Prints the rules most relevant to an application and its compliance report.
#[derive(Parser, Debug)]
#[command(name = "report")]
struct Args {
    /// Application JSON with flat facility attributes.
    #[arg(default_value = "industrial_application.json")]
    application: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let content = tokio::fs::read_to_string(&args.application)
        .await
        .with_context(|| format!("Failed to read {}", args.application.display()))?;
    let application: IndustrialApplication = serde_json::from_str(&content)
        .with_context(|| format!("Invalid application JSON in {}", args.application.display()))?;

    let service = ComplianceService::new(load_config()).await?;
    let (rules, report) = service.generate_report_with_rules(&application).await?;

    println!("\nTop Relevant Compliance Rules:\n");
    for rule in &rules {
        println!("- {}", rule);
    }
    println!("\nGenerated Compliance Report:\n\n{}", report);
    Ok(())
}
