//! Streaming scan abstraction for export operations
//!
//! This module wraps the cluster's scan-and-scroll mechanism behind a
//! unified paging interface so the export pipeline can drain an index
//! without loading all results into memory.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::{EsClient, Hit};
use crate::error::{ClientError, Result};

/// Trait for draining an index in pages
///
/// One implementation exists per scan mechanism; the pipeline only ever
/// sees this interface, which keeps it testable without a cluster.
#[async_trait]
pub trait StreamingScan: Send {
    /// Fetch the next page of records
    ///
    /// # Returns
    /// * `Result<Option<Vec<Hit>>>` - Next page in server order, or None
    ///   once the index is fully drained
    async fn next_page(&mut self) -> Result<Option<Vec<Hit>>>;

    /// Total number of matching records, once the server has reported it
    fn total_hits(&self) -> Option<u64>;

    /// Close the scan and release server-side resources (best-effort)
    async fn close(&mut self) -> Result<()>;
}

/// Scroll-backed scan over one index
///
/// Owns the scroll handle exclusively for the lifetime of one export job.
/// The first fetch opens the cursor; later fetches continue it. Pages are
/// monotonic and non-overlapping, which the server's scroll contract
/// guarantees. Once the validity window lapses with no successful fetch,
/// the next call fails with `CursorExpired` and the scan is unusable.
pub struct ScrollScan {
    client: EsClient,
    index: String,
    doc_type: Option<String>,
    size: u32,
    keep_alive: Duration,
    scroll_id: Option<String>,
    total: Option<u64>,
    last_fetch: Option<Instant>,
    total_fetched: u64,
    closed: bool,
}

impl ScrollScan {
    /// Create a new scroll scan
    ///
    /// # Arguments
    /// * `client` - Elasticsearch client
    /// * `index` - Index to drain
    /// * `doc_type` - Optional mapping type to narrow the scan to
    /// * `size` - Page size requested per shard
    /// * `keep_alive` - Scroll validity window
    pub fn new(
        client: EsClient,
        index: String,
        doc_type: Option<String>,
        size: u32,
        keep_alive: Duration,
    ) -> Self {
        Self {
            client,
            index,
            doc_type,
            size,
            keep_alive,
            scroll_id: None,
            total: None,
            last_fetch: None,
            total_fetched: 0,
            closed: false,
        }
    }

    /// Whether the validity window has lapsed since the last successful fetch.
    fn is_expired(&self) -> bool {
        self.last_fetch
            .is_some_and(|last| last.elapsed() > self.keep_alive)
    }
}

#[async_trait]
impl StreamingScan for ScrollScan {
    async fn next_page(&mut self) -> Result<Option<Vec<Hit>>> {
        if self.closed {
            return Ok(None);
        }

        // The server discards the context once the window lapses; fail the
        // fetch here instead of issuing a doomed request.
        if self.is_expired() {
            self.closed = true;
            self.scroll_id = None;
            return Err(ClientError::CursorExpired.into());
        }

        let page = match self.scroll_id.as_deref() {
            None => {
                self.client
                    .open_scroll(
                        &self.index,
                        self.doc_type.as_deref(),
                        self.size,
                        self.keep_alive,
                    )
                    .await?
            }
            Some(scroll_id) => {
                self.client
                    .continue_scroll(scroll_id, self.keep_alive)
                    .await?
            }
        };

        self.last_fetch = Some(Instant::now());
        if let Some(scroll_id) = page.scroll_id {
            self.scroll_id = Some(scroll_id);
        }
        if self.total.is_none() {
            self.total = page.total;
        }

        if page.hits.is_empty() {
            debug!(
                "Scroll over '{}' exhausted after {} documents",
                self.index, self.total_fetched
            );
            self.close().await?;
            return Ok(None);
        }

        self.total_fetched += page.hits.len() as u64;
        debug!(
            "Fetched page of {} documents (total: {})",
            page.hits.len(),
            self.total_fetched
        );
        Ok(Some(page.hits))
    }

    fn total_hits(&self) -> Option<u64> {
        self.total
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed && self.scroll_id.is_none() {
            return Ok(());
        }

        self.closed = true;
        if let Some(scroll_id) = self.scroll_id.take() {
            // Clearing the context is best-effort; the server expires it on
            // its own once the window lapses.
            if let Err(e) = self.client.clear_scroll(&scroll_id).await {
                debug!("Failed to clear scroll context: {}", e);
            }
        }
        info!(
            "Closed scroll over '{}' after fetching {} documents",
            self.index, self.total_fetched
        );
        Ok(())
    }
}

impl Drop for ScrollScan {
    fn drop(&mut self) {
        if !self.closed {
            debug!("ScrollScan dropped without explicit close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;

    fn test_client() -> EsClient {
        EsClient::new("http://localhost:9200", &ConnectionConfig::default()).unwrap()
    }

    #[test]
    fn test_streaming_scan_trait_object() {
        // Verify StreamingScan works as a trait object
        fn _accepts_scan(_scan: Box<dyn StreamingScan>) {}
    }

    #[tokio::test]
    async fn test_expired_scan_fails_without_request() {
        let mut scan = ScrollScan::new(
            test_client(),
            "orders".to_string(),
            None,
            100,
            Duration::from_millis(1),
        );
        scan.scroll_id = Some("stale".to_string());
        scan.last_fetch = Instant::now().checked_sub(Duration::from_secs(1));
        assert!(scan.last_fetch.is_some());

        let err = scan.next_page().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::EsdumpError::Client(ClientError::CursorExpired)
        ));

        // Terminal: later fetches report end-of-sequence, never records
        assert!(scan.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fresh_scan_is_not_expired() {
        let scan = ScrollScan::new(
            test_client(),
            "orders".to_string(),
            None,
            100,
            Duration::from_secs(60),
        );
        assert!(!scan.is_expired());
        assert_eq!(scan.total_hits(), None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut scan = ScrollScan::new(
            test_client(),
            "orders".to_string(),
            None,
            100,
            Duration::from_secs(60),
        );
        scan.closed = true;
        assert!(scan.close().await.is_ok());
        assert!(scan.close().await.is_ok());
    }
}
