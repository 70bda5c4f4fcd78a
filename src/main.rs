//! One-shot crawl runner
//!
//! Runs a single session for the given URLs and prints every update as a JSON
//! line on stdout. Logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use intelscrape::{
    CrawlConfig, CrawlEvent, CrawlOrchestrator, HttpClassifier, SqlitePersistence,
};

#[derive(Debug, Parser)]
#[command(name = "intelscrape", version, about = "Crawl security news sources into threat intelligence")]
struct Args {
    /// JSON crawl configuration (camelCase fields, all optional)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database receiving the processed articles
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Skip AI classification
    #[arg(long)]
    no_ai: bool,

    /// Seed URLs
    #[arg(required = true, value_name = "URL")]
    urls: Vec<String>,
}

fn load_config(args: &Args) -> Result<CrawlConfig> {
    let config = match &args.config {
        Some(path) => CrawlConfig::from_json_file(path)?,
        None => CrawlConfig::default(),
    };
    if args.no_ai {
        return Ok(config.to_builder().enable_ai_processing(false).build()?);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mut orchestrator = CrawlOrchestrator::chromium();

    if config.enable_ai_processing() {
        match std::env::var("INTELSCRAPE_AI_API_KEY") {
            Ok(key) if !key.is_empty() => {
                let mut classifier = HttpClassifier::new(&key);
                if let Ok(url) = std::env::var("INTELSCRAPE_AI_BASE_URL") {
                    classifier = classifier.with_base_url(&url);
                }
                if let Ok(model) = std::env::var("INTELSCRAPE_AI_MODEL") {
                    classifier = classifier.with_model(&model);
                }
                orchestrator = orchestrator.with_classifier(Arc::new(classifier));
            }
            _ => tracing::warn!("INTELSCRAPE_AI_API_KEY is not set; classification will be skipped"),
        }
    }

    let database = match &args.database {
        Some(path) => {
            let url = format!("sqlite://{}", path.display());
            let store = SqlitePersistence::connect(&url)
                .await
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            Some(Arc::new(store))
        }
        None => None,
    };
    if let Some(store) = &database {
        orchestrator = orchestrator.with_persistence(store.clone());
    }

    let handle = orchestrator.start(args.urls.clone(), config)?;
    let mut updates = std::pin::pin!(handle.updates());
    let mut failed = false;
    let mut interrupted = false;

    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(update) = update else { break };
                if matches!(update.event, CrawlEvent::Error(_)) {
                    failed = true;
                }
                println!("{}", serde_json::to_string(&update)?);
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                if signal.is_ok() {
                    tracing::info!("Interrupted; cancelling crawl");
                    handle.abort();
                }
            }
        }
    }

    handle.wait().await;
    if let Some(store) = database {
        store.close().await;
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
