//! Onbid Server Library
//!
//! Ingests KAMCO public-sale listings from the Onbid open-data API into
//! PostgreSQL and serves an interactive listing query.
//!
//! # Overview
//!
//! - **Ingestion**: paginated fetch, streaming XML parse, chunked load into
//!   `kamco_auction_items` (see [`ingest`])
//! - **API Endpoints**: batch trigger and listing proxy (see [`features`])
//! - **Configuration**: environment-based, `.env` aware (see [`config`])
//! - **Middleware**: CORS and request tracing
//!
//! # Example
//!
//! ```no_run
//! use onbid_server::ingest::onbid::{IngestionPipeline, OnbidClient, PgAuctionStore, RunGuard};
//! use onbid_server::ingest::OnbidApiConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgresql://localhost/onbid").await?;
//!     let client = OnbidClient::new(OnbidApiConfig::from_env()?)?;
//!     let pipeline = IngestionPipeline::new(client, PgAuctionStore::new(pool), RunGuard::new());
//!     println!("{}", pipeline.run().await?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;

pub use error::AppError;
