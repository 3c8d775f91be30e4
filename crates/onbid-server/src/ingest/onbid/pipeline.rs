// Onbid ingestion pipeline
//
// One run:
// 1. Take the run permit (a concurrent trigger gets RunInProgress)
// 2. Clear the destination table
// 3. For each page 1..=total_pages: fetch, parse, load, then pause
// 4. Commit the load and report the summary
//
// Any fetch, parse or storage error aborts the run and rolls back every
// insert made so far. There are no retries.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::client::OnbidClient;
use super::guard::RunGuard;
use super::parser::{parse_page, ResponseHeader};
use super::storage::{AuctionStore, BatchLoader};
use super::Result;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub started_at: DateTime<Utc>,
    pub total_records: usize,
    pub elapsed: Duration,
    pub first_page: u32,
    pub last_page: u32,
    pub chunk_commits: usize,
}

impl IngestionSummary {
    /// One-line report, e.g. `Loaded 25000 records (pages 1-10) in 12.345 s`
    pub fn summary(&self) -> String {
        format!(
            "Loaded {} records (pages {}-{}) in {}.{:03} s",
            self.total_records,
            self.first_page,
            self.last_page,
            self.elapsed.as_secs(),
            self.elapsed.subsec_millis()
        )
    }
}

impl fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Fetch -> parse -> load for a fixed number of pages
pub struct IngestionPipeline<S: AuctionStore> {
    client: OnbidClient,
    store: S,
    guard: RunGuard,
    total_pages: u32,
    page_delay: Duration,
}

impl<S: AuctionStore> IngestionPipeline<S> {
    /// Page count and delay come from the client's configuration
    pub fn new(client: OnbidClient, store: S, guard: RunGuard) -> Self {
        let total_pages = client.config().total_pages;
        let page_delay = client.config().page_delay();

        Self {
            client,
            store,
            guard,
            total_pages,
            page_delay,
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Execute one full ingestion run
    pub async fn run(&self) -> Result<IngestionSummary> {
        let _permit = self.guard.try_acquire()?;
        let started_at = Utc::now();
        let started = Instant::now();

        info!(
            pages = self.total_pages,
            started_at = %started_at.to_rfc3339(),
            delay_ms = self.page_delay.as_millis() as u64,
            "Starting Onbid ingestion run"
        );

        let deleted = self.store.clear().await?;
        info!(deleted, "Destination table cleared");

        let mut loader = BatchLoader::begin(&self.store).await?;

        let total_records = match self.load_pages(&mut loader).await {
            Ok(total) => total,
            Err(e) => {
                error!(error = %e, rows_rolled_back = loader.rows_written(), "Ingestion run failed");
                if let Err(rollback_err) = loader.rollback().await {
                    warn!(error = %rollback_err, "Rollback of load transaction failed");
                }
                return Err(e);
            },
        };

        let chunk_commits = loader.commit().await?;

        let summary = IngestionSummary {
            started_at,
            total_records,
            elapsed: started.elapsed(),
            first_page: 1,
            last_page: self.total_pages,
            chunk_commits,
        };

        info!(
            total_records = summary.total_records,
            chunk_commits = summary.chunk_commits,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Onbid ingestion run complete"
        );

        Ok(summary)
    }

    async fn load_pages(&self, loader: &mut BatchLoader<S::Session>) -> Result<usize> {
        let mut total = 0;

        for page in 1..=self.total_pages {
            info!(page, total_pages = self.total_pages, "Fetching page");
            let xml = self.client.fetch_page(page).await?;

            if let Some(header) = ResponseHeader::from_xml(&xml).filter(|h| !h.is_normal()) {
                warn!(
                    page,
                    result_code = header.result_code.as_deref().unwrap_or_default(),
                    result_msg = header.result_msg.as_deref().unwrap_or_default(),
                    "Onbid API reported a non-normal result"
                );
            }

            let parsed = loader.load_page(parse_page(&xml)).await?;
            total += parsed;
            info!(page, parsed, total, "Page loaded");

            tokio::time::sleep(self.page_delay).await;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_format() {
        let summary = IngestionSummary {
            started_at: Utc::now(),
            total_records: 2500,
            elapsed: Duration::from_millis(12_045),
            first_page: 1,
            last_page: 10,
            chunk_commits: 3,
        };

        assert_eq!(summary.summary(), "Loaded 2500 records (pages 1-10) in 12.045 s");
        assert_eq!(summary.to_string(), summary.summary());
    }
}
