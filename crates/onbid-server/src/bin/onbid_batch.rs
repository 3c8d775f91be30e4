//! Onbid batch - run one ingestion from the command line
//!
//! Same pipeline as `GET /api/onbid/batch`, without the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use onbid_common::logging::{init_logging, LogConfig, LogLevel};
use sqlx::postgres::PgPoolOptions;
use std::process;
use std::time::Duration;
use tracing::{error, info};

use onbid_server::config::DatabaseConfig;
use onbid_server::ingest::onbid::{
    AuctionStore, IngestionPipeline, IngestionSummary, MemoryAuctionStore, OnbidApiConfig,
    OnbidClient, PgAuctionStore, RunGuard,
};

#[derive(Parser, Debug)]
#[command(name = "onbid-batch")]
#[command(author, version, about = "Load KAMCO auction listings into PostgreSQL", long_about = None)]
struct Cli {
    /// Pages to fetch (defaults to ONBID_TOTAL_PAGES)
    #[arg(long)]
    pages: Option<u32>,

    /// Pause between pages in milliseconds (defaults to ONBID_PAGE_DELAY_MS)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Parse and count records without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_config = LogConfig::builder()
        .level(level)
        .log_file_prefix("onbid-batch")
        .build();
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match run(&cli).await {
        Ok(summary) => println!("{}", summary),
        Err(e) => {
            error!(error = %e, "Batch run failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        },
    }
}

async fn run(cli: &Cli) -> Result<IngestionSummary> {
    let mut config = OnbidApiConfig::from_env().context("Failed to load Onbid API config")?;
    if let Some(pages) = cli.pages {
        config.total_pages = pages;
    }
    if let Some(delay) = cli.delay_ms {
        config.page_delay_ms = delay;
    }

    info!(?config, dry_run = cli.dry_run, "Starting batch run");
    let client = OnbidClient::new(config)?;

    if cli.dry_run {
        return execute(client, MemoryAuctionStore::new()).await;
    }

    let database = DatabaseConfig::from_env();
    database.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(Duration::from_secs(database.connect_timeout_secs))
        .connect(&database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    execute(client, PgAuctionStore::new(pool)).await
}

async fn execute<S: AuctionStore>(client: OnbidClient, store: S) -> Result<IngestionSummary> {
    let pipeline = IngestionPipeline::new(client, store, RunGuard::new());
    Ok(pipeline.run().await?)
}
