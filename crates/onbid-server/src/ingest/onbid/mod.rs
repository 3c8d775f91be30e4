// Onbid (KAMCO public sale) ingestion module
//
// Pulls the public auction listing feed page by page and replaces the
// kamco_auction_items table with the result.
//
// - Client: HTTP access to the list endpoint (batch pages and interactive queries)
// - Parse: streaming XML parser for response/body/items/item pages
// - Normalize: tree-shaped XML to camelCase JSON for the interactive query path
// - Store: DELETE once, then chunked inserts inside one load transaction
// - Pipeline: fetch -> parse -> load for a fixed number of pages
//
// Upstream: http://openapi.onbid.co.kr/openapi/services/KamcoPblsalThingInquireSvc/getKamcoPbctCltrList

pub mod client;
pub mod config;
pub mod guard;
pub mod memory;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod storage;

pub use client::{ListQuery, OnbidClient};
pub use config::OnbidApiConfig;
pub use guard::{RunGuard, RunPermit};
pub use memory::MemoryAuctionStore;
pub use models::{AuctionItem, ImageLink, OnbidListPage};
pub use normalizer::{normalize_list_response, to_camel_case, XmlNode};
pub use parser::{parse_page, ResponseHeader};
pub use pipeline::{IngestionPipeline, IngestionSummary};
pub use storage::{AuctionStore, BatchLoader, LoadSession, PgAuctionStore};

/// Records per chunk commit
pub const CHUNK_SIZE: usize = 1000;

/// Destination table for the batch load
pub const AUCTION_TABLE: &str = "kamco_auction_items";

/// Result type for Onbid ingestion
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for Onbid ingestion
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("An ingestion run is already in progress")]
    RunInProgress,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    /// Wrap an XML reader error with the byte position it was raised at
    pub(crate) fn xml(err: impl std::fmt::Display, position: impl std::fmt::Display) -> Self {
        IngestError::Parse(format!("malformed XML at byte {}: {}", position, err))
    }
}
