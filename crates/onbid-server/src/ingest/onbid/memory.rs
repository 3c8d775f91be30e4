// In-memory auction store
//
// Same load semantics as PgAuctionStore without a database: staged chunks
// become visible only on commit. Used by `onbid-batch --dry-run` and by tests,
// which can make a given chunk fail.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::models::AuctionItem;
use super::storage::{AuctionStore, LoadSession};
use super::{IngestError, Result};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<AuctionItem>,
    /// Chunk sizes of the last committed load
    committed_chunks: Vec<usize>,
}

/// Auction store held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAuctionStore {
    table: Arc<Mutex<Table>>,
    fail_on_chunk: Option<usize>,
}

impl MemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th chunk (1-based) of every load fail
    pub fn fail_on_chunk(mut self, chunk: usize) -> Self {
        self.fail_on_chunk = Some(chunk);
        self
    }

    /// Seed the table, e.g. with rows from a previous run
    pub async fn with_rows(self, rows: Vec<AuctionItem>) -> Self {
        self.table.lock().await.rows = rows;
        self
    }

    pub async fn rows(&self) -> Vec<AuctionItem> {
        self.table.lock().await.rows.clone()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn committed_chunks(&self) -> Vec<usize> {
        self.table.lock().await.committed_chunks.clone()
    }
}

#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    type Session = MemoryLoadSession;

    async fn clear(&self) -> Result<u64> {
        let mut table = self.table.lock().await;
        let deleted = table.rows.len() as u64;
        table.rows.clear();
        table.committed_chunks.clear();
        Ok(deleted)
    }

    async fn begin_load(&self) -> Result<MemoryLoadSession> {
        Ok(MemoryLoadSession {
            table: Arc::clone(&self.table),
            fail_on_chunk: self.fail_on_chunk,
            staged: Vec::new(),
            chunks: Vec::new(),
        })
    }
}

/// Staged load against a [`MemoryAuctionStore`]
#[derive(Debug)]
pub struct MemoryLoadSession {
    table: Arc<Mutex<Table>>,
    fail_on_chunk: Option<usize>,
    staged: Vec<AuctionItem>,
    chunks: Vec<usize>,
}

#[async_trait]
impl LoadSession for MemoryLoadSession {
    async fn insert_chunk(&mut self, chunk: &[AuctionItem]) -> Result<()> {
        let number = self.chunks.len() + 1;
        if self.fail_on_chunk == Some(number) {
            return Err(IngestError::Storage(format!("chunk {} rejected", number)));
        }

        self.staged.extend_from_slice(chunk);
        self.chunks.push(chunk.len());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let mut table = self.table.lock().await;
        table.rows.extend(self.staged);
        table.committed_chunks = self.chunks;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
