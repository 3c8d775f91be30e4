// Storage layer for Onbid auction items
//
// Full-table replacement:
// 1. DELETE every row, auto-committed on its own
// 2. One transaction for the whole load; records go in as 1000-row
//    multi-row INSERTs, each wrapped in a savepoint that is released once the
//    chunk succeeds (the chunk commit)
// 3. COMMIT after the last page, or ROLLBACK on any failure
//
// A failure on any page therefore leaves the table empty: the delete is
// already committed and every insert of the run is rolled back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, info};

use super::models::AuctionItem;
use super::{Result, AUCTION_TABLE, CHUNK_SIZE};

/// Destination of a full-table load
#[async_trait]
pub trait AuctionStore: Send + Sync {
    type Session: LoadSession;

    /// Remove all rows; returns the number deleted
    async fn clear(&self) -> Result<u64>;

    /// Open the transaction that receives every chunk of one run
    async fn begin_load(&self) -> Result<Self::Session>;
}

/// One load transaction
#[async_trait]
pub trait LoadSession: Send {
    /// Write one chunk and mark it committed within the load
    async fn insert_chunk(&mut self, chunk: &[AuctionItem]) -> Result<()>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Buffers records into fixed-size chunks for a [`LoadSession`]
pub struct BatchLoader<L: LoadSession> {
    session: L,
    buffer: Vec<AuctionItem>,
    chunk_size: usize,
    chunk_commits: usize,
    rows_written: usize,
}

impl<L: LoadSession> BatchLoader<L> {
    /// Begin a load on `store` with the standard chunk size
    pub async fn begin<S>(store: &S) -> Result<Self>
    where
        S: AuctionStore<Session = L>,
    {
        Ok(Self::with_chunk_size(store.begin_load().await?, CHUNK_SIZE))
    }

    pub fn with_chunk_size(session: L, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            session,
            buffer: Vec::with_capacity(chunk_size),
            chunk_size,
            chunk_commits: 0,
            rows_written: 0,
        }
    }

    /// Load one page's records, flushing full chunks as they fill and the
    /// partial chunk at the end; returns the number of records taken
    pub async fn load_page<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<AuctionItem>>,
        I::IntoIter: Send,
    {
        let mut count = 0;

        for record in records {
            self.buffer.push(record?);
            count += 1;

            if self.buffer.len() >= self.chunk_size {
                self.flush().await?;
            }
        }

        self.flush().await?;
        Ok(count)
    }

    async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.session.insert_chunk(&self.buffer).await?;
        self.chunk_commits += 1;
        self.rows_written += self.buffer.len();
        debug!(
            chunk = self.chunk_commits,
            size = self.buffer.len(),
            rows = self.rows_written,
            "Chunk committed"
        );
        self.buffer.clear();

        Ok(())
    }

    pub fn chunk_commits(&self) -> usize {
        self.chunk_commits
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Commit the load; returns the number of chunk commits
    pub async fn commit(mut self) -> Result<usize> {
        self.flush().await?;
        self.session.commit().await?;
        Ok(self.chunk_commits)
    }

    /// Discard every chunk of this load
    pub async fn rollback(self) -> Result<()> {
        self.session.rollback().await
    }
}

/// PostgreSQL-backed store for `kamco_auction_items`
#[derive(Clone)]
pub struct PgAuctionStore {
    db: PgPool,
}

impl PgAuctionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current row count of the destination table
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", AUCTION_TABLE))
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AuctionStore for PgAuctionStore {
    type Session = PgLoadSession;

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM {}", AUCTION_TABLE))
            .execute(&self.db)
            .await?;

        info!(deleted = result.rows_affected(), "Cleared {}", AUCTION_TABLE);
        Ok(result.rows_affected())
    }

    async fn begin_load(&self) -> Result<PgLoadSession> {
        let tx = self.db.begin().await?;
        Ok(PgLoadSession { tx })
    }
}

/// Load transaction on PostgreSQL
///
/// Dropping the session without `commit` rolls the transaction back and
/// returns the connection to the pool with no transaction open.
pub struct PgLoadSession {
    tx: Transaction<'static, Postgres>,
}

const CHUNK_SAVEPOINT: &str = "onbid_chunk";

#[async_trait]
impl LoadSession for PgLoadSession {
    async fn insert_chunk(&mut self, chunk: &[AuctionItem]) -> Result<()> {
        sqlx::query(&format!("SAVEPOINT {}", CHUNK_SAVEPOINT))
            .execute(&mut *self.tx)
            .await?;

        insert_query(chunk).build().execute(&mut *self.tx).await?;

        sqlx::query(&format!("RELEASE SAVEPOINT {}", CHUNK_SAVEPOINT))
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Multi-row INSERT for one chunk (38 binds per record)
fn insert_query(chunk: &[AuctionItem]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}, cltr_img_files) ",
        AUCTION_TABLE,
        AuctionItem::COLUMNS.join(", ")
    ));

    builder.push_values(chunk, |mut row, item| {
        for value in item.text_values() {
            row.push_bind(value.map(str::to_owned));
        }
        row.push_bind(item.image_files_column());
    });

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::onbid::{memory::MemoryAuctionStore, IngestError};

    fn records(n: usize) -> Vec<Result<AuctionItem>> {
        (0..n)
            .map(|i| {
                Ok(AuctionItem {
                    rnum: Some(i.to_string()),
                    ..Default::default()
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_2500_records_make_three_chunks() {
        let store = MemoryAuctionStore::new();
        let mut loader = BatchLoader::begin(&store).await.unwrap();

        let loaded = loader.load_page(records(2500)).await.unwrap();
        assert_eq!(loaded, 2500);
        assert_eq!(loader.chunk_commits(), 3);

        let commits = loader.commit().await.unwrap();
        assert_eq!(commits, 3);
        assert_eq!(store.committed_chunks().await, vec![1000, 1000, 500]);
        assert_eq!(store.len().await, 2500);
    }

    #[tokio::test]
    async fn test_partial_chunk_flushed_per_page() {
        let store = MemoryAuctionStore::new();
        let mut loader = BatchLoader::begin(&store).await.unwrap();

        loader.load_page(records(10)).await.unwrap();
        loader.load_page(records(0)).await.unwrap();
        loader.load_page(records(5)).await.unwrap();

        assert_eq!(loader.commit().await.unwrap(), 2);
        assert_eq!(store.committed_chunks().await, vec![10, 5]);
    }

    #[tokio::test]
    async fn test_record_error_stops_page() {
        let store = MemoryAuctionStore::new();
        let mut loader = BatchLoader::begin(&store).await.unwrap();

        let mut page = records(3);
        page.push(Err(IngestError::Parse("broken".to_string())));
        page.extend(records(3));

        assert!(loader.load_page(page).await.is_err());
        loader.rollback().await.unwrap();
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_chunk_failure_rolls_back_whole_load() {
        let store = MemoryAuctionStore::new().fail_on_chunk(3);
        let mut loader = BatchLoader::begin(&store).await.unwrap();

        let result = loader.load_page(records(2500)).await;
        assert!(matches!(result, Err(IngestError::Storage(_))));
        assert_eq!(loader.chunk_commits(), 2);

        loader.rollback().await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(store.committed_chunks().await.is_empty());
    }

    #[test]
    fn test_insert_query_shape() {
        let chunk = vec![AuctionItem::default(), AuctionItem::default()];
        let builder = insert_query(&chunk);
        let sql = builder.sql();

        assert!(sql.starts_with("INSERT INTO kamco_auction_items (rnum, plnm_no,"));
        assert!(sql.contains("mmb_rgt_nm, cltr_img_files) VALUES ("));
        assert!(sql.contains("$76"));
        assert!(!sql.contains("$77"));
    }
}
