use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use revscan_analyzer::sink::CsvSink;
use revscan_analyzer::{normalize, Analyzer, Classifier, InferenceContext};
use revscan_common::{AnalysisReport, Config};
use serpapi_client::SerpApiClient;

#[derive(Parser)]
#[command(name = "revscan", about = "Fake review detection for Amazon products")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, classify and summarise the reviews of one product
    Analyze {
        /// Product URL or bare ASIN
        identifier: String,
        /// Page-count hint (accepted for compatibility; collection is domain-driven)
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the marketplace domain and ASIN parsed from an input
    ExtractId {
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("revscan=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::ExtractId { input } => {
            let product = normalize(&input)?;
            println!("domain: {}", product.domain);
            println!("asin:   {}", product.id);
        }
        Command::Analyze {
            identifier,
            pages,
            json,
        } => {
            let config = Config::from_env();
            config.log_redacted();

            let context = InferenceContext::load(&config.model_dir, config.labels_path.as_deref())?;
            let source = SerpApiClient::new(config.serpapi_api_key.clone(), config.serpapi_timeout())?;
            let analyzer = Analyzer::new(
                Arc::new(source),
                Arc::new(Classifier::new(Arc::new(context))),
                Arc::new(CsvSink::new(&config.results_path)),
            )
            .with_review_target(config.review_target);

            let report = analyzer.analyze(&identifier, pages).await?;
            info!(results_path = %config.results_path.display(), "Results written");

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let summary = &report.summary;
    println!("Product:        {}", report.product);
    println!("Total reviews:  {}", summary.total_reviews);
    println!("Fake:           {:.2}%", summary.fake_percent);
    println!("Genuine:        {:.2}%", summary.genuine_percent);
    println!("Avg confidence: {:.2}%", summary.avg_confidence);
    println!();
    for row in &report.results {
        let preview: String = row.review.chars().take(80).collect();
        println!("{:<8} {:>6.2}  {}", row.prediction.to_string(), row.confidence, preview);
    }
}
