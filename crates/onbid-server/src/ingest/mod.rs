//! Data ingestion
//!
//! # Sources
//!
//! - **onbid**: KAMCO public sale listings from the Onbid open-data API,
//!   loaded into `kamco_auction_items` by full-table replacement
//!
//! # Triggers
//!
//! Runs are started on demand, never on a schedule:
//! - `GET /api/onbid/batch` on the server
//! - the `onbid-batch` command-line tool
//!
//! Both go through [`onbid::IngestionPipeline`], which refuses to start while
//! another run holds its [`onbid::RunGuard`].

pub mod onbid;

pub use onbid::{IngestError, IngestionPipeline, IngestionSummary, OnbidApiConfig, RunGuard};
