//! Export coordinator for orchestrating dump operations
//!
//! Brings together the streaming scan, the record serializer, the page
//! sink, and progress tracking. Pages are fetched and written strictly
//! sequentially: the coordinator never requests a page while a prior
//! page's append is outstanding, and a failed fetch or append aborts the
//! whole job with no retry. The scroll is closed (best-effort) on every
//! terminal path.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{EsdumpError, Result};

use super::progress::ProgressTracker;
use super::record::serialize_hit;
use super::scroll::StreamingScan;
use super::writer::PageSink;

/// Result of an export operation
#[derive(Debug)]
pub struct ExportResult {
    /// Number of documents exported
    pub documents_exported: u64,
    /// Number of pages written
    pub pages: u32,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Time taken for export
    pub elapsed_ms: u64,
    /// Whether the export was cancelled
    pub cancelled: bool,
}

/// Coordinator for export operations
///
/// Drains the scan page by page; every page is serialized fully in memory
/// before its one append call, so the dump file is only ever truncated at
/// a page boundary, never mid-record.
pub struct ExportCoordinator {
    /// Streaming scan producing pages of records
    scan: Box<dyn StreamingScan>,
    /// Progress tracker for user feedback
    tracker: ProgressTracker,
    /// Destination sink for serialized pages
    sink: Box<dyn PageSink>,
    /// Cancellation token for aborting between pages
    cancel_token: Option<CancellationToken>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(
        scan: Box<dyn StreamingScan>,
        tracker: ProgressTracker,
        sink: Box<dyn PageSink>,
    ) -> Self {
        Self {
            scan,
            tracker,
            sink,
            cancel_token: None,
        }
    }

    /// Set cancellation token for this export operation
    ///
    /// Cancellation is only honored at page boundaries; a page that has
    /// started draining always lands completely.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Execute the export operation
    ///
    /// Runs the pipeline to one of its terminal states:
    /// 1. Fetch the next page from the scan
    /// 2. Serialize every record of the page in memory
    /// 3. Append the page to the sink as one unit
    /// 4. Repeat until the scan is exhausted, a fetch or append fails, or
    ///    cancellation is requested
    ///
    /// # Returns
    /// * `Result<ExportResult>` - Export statistics or the fatal error
    pub async fn execute(&mut self) -> Result<ExportResult> {
        let start_time = Instant::now();

        info!("Starting export");
        let mut exported = 0u64;
        let mut pages = 0u32;
        let mut total_reported = false;

        loop {
            if let Some(ref token) = self.cancel_token {
                if token.is_cancelled() {
                    info!("Export cancelled, stopping at page boundary");
                    return self.finish(start_time, exported, pages, true).await;
                }
            }

            debug!("Fetching page #{}", pages + 1);

            let page = match self.scan.next_page().await {
                Ok(page) => page,
                Err(e) => return self.abort(e).await,
            };

            let Some(hits) = page else {
                debug!("Scan exhausted");
                break;
            };

            if !total_reported {
                if let Some(total) = self.scan.total_hits() {
                    self.tracker.set_total(total);
                    total_reported = true;
                }
            }

            // Serialize the whole page before touching the file; a record
            // that fails to serialize must not leave a partial page behind.
            let mut lines = Vec::with_capacity(hits.len());
            for hit in &hits {
                match serialize_hit(hit) {
                    Ok(line) => lines.push(line),
                    Err(e) => return self.abort(e).await,
                }
            }

            let count = match self.sink.append_page(&lines).await {
                Ok(count) => count,
                Err(e) => return self.abort(e).await,
            };

            exported += count as u64;
            pages += 1;
            self.tracker.update(exported);
            info!("Saved {} documents", count);
        }

        self.finish(start_time, exported, pages, false).await
    }

    /// Leave the pipeline through its success (or cancelled) terminal state.
    async fn finish(
        &mut self,
        start_time: Instant,
        exported: u64,
        pages: u32,
        cancelled: bool,
    ) -> Result<ExportResult> {
        let finalized = self.sink.finalize().await;
        // Closing the scroll is best-effort on every terminal path and
        // never fails the job.
        let _ = self.scan.close().await;
        self.tracker.finish();
        finalized?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        let file_size_bytes = self.sink.file_size().await.unwrap_or(0);

        info!(
            "Export {}: {} documents, {} pages, {} bytes, {} ms",
            if cancelled { "cancelled" } else { "completed" },
            exported,
            pages,
            file_size_bytes,
            elapsed_ms
        );

        Ok(ExportResult {
            documents_exported: exported,
            pages,
            file_size_bytes,
            elapsed_ms,
            cancelled,
        })
    }

    /// Leave the pipeline through its failed terminal state.
    ///
    /// Already-written pages stay in the file untouched; the scroll is
    /// released best-effort so server-side resources are not leaked.
    async fn abort(&mut self, error: EsdumpError) -> Result<ExportResult> {
        let _ = self.sink.finalize().await;
        let _ = self.scan.close().await;
        self.tracker.finish();
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::client::Hit;
    use crate::error::{ClientError, ExportError};

    fn hits(range: std::ops::Range<u32>) -> Vec<Hit> {
        range
            .map(|n| Hit {
                id: n.to_string(),
                source: json!({ "n": n }),
            })
            .collect()
    }

    // Mock scan feeding canned pages, optionally failing at a given fetch
    struct MockScan {
        pages: Vec<Vec<Hit>>,
        current: usize,
        total: Option<u64>,
        fail_on_fetch: Option<usize>,
        closed: Arc<AtomicBool>,
    }

    impl MockScan {
        fn new(pages: Vec<Vec<Hit>>) -> Self {
            let total = pages.iter().map(|p| p.len() as u64).sum();
            Self {
                pages,
                current: 0,
                total: Some(total),
                fail_on_fetch: None,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        fn failing_at(mut self, fetch: usize) -> Self {
            self.fail_on_fetch = Some(fetch);
            self
        }

        fn closed_handle(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.closed)
        }
    }

    #[async_trait]
    impl StreamingScan for MockScan {
        async fn next_page(&mut self) -> Result<Option<Vec<Hit>>> {
            if self.fail_on_fetch == Some(self.current + 1) {
                return Err(ClientError::CursorExpired.into());
            }
            if self.current < self.pages.len() {
                let page = self.pages[self.current].clone();
                self.current += 1;
                Ok(Some(page))
            } else {
                Ok(None)
            }
        }

        fn total_hits(&self) -> Option<u64> {
            self.total
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    // Mock sink recording appended pages through a shared handle,
    // optionally failing at a given page
    struct MockSink {
        pages: Arc<Mutex<Vec<Vec<String>>>>,
        fail_on_page: Option<usize>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                pages: Arc::new(Mutex::new(Vec::new())),
                fail_on_page: None,
            }
        }

        fn failing_at(mut self, page: usize) -> Self {
            self.fail_on_page = Some(page);
            self
        }

        fn pages_handle(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
            Arc::clone(&self.pages)
        }
    }

    #[async_trait]
    impl PageSink for MockSink {
        async fn append_page(&mut self, lines: &[String]) -> Result<usize> {
            let mut pages = self.pages.lock().unwrap();
            if self.fail_on_page == Some(pages.len() + 1) {
                return Err(ExportError::WriteFailure("disk full".to_string()).into());
            }
            pages.push(lines.to_vec());
            Ok(lines.len())
        }

        async fn finalize(&mut self) -> Result<()> {
            Ok(())
        }

        async fn file_size(&self) -> Result<u64> {
            let lines: usize = self.pages.lock().unwrap().iter().map(Vec::len).sum();
            Ok(lines as u64 * 32)
        }
    }

    fn coordinator(scan: MockScan, sink: MockSink) -> ExportCoordinator {
        ExportCoordinator::new(
            Box::new(scan),
            ProgressTracker::new(None, false),
            Box::new(sink),
        )
    }

    #[tokio::test]
    async fn test_drains_all_pages() {
        // 250 documents at page size 100: three pages of 100, 100, 50
        let scan = MockScan::new(vec![hits(0..100), hits(100..200), hits(200..250)]);
        let sink = MockSink::new();
        let pages = sink.pages_handle();
        let mut coordinator = coordinator(scan, sink);

        let result = coordinator.execute().await.unwrap();
        assert_eq!(result.documents_exported, 250);
        assert_eq!(result.pages, 3);
        assert!(!result.cancelled);

        let pages = pages.lock().unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 100);
        assert_eq!(pages[2].len(), 50);
    }

    #[tokio::test]
    async fn test_empty_scan_completes_with_zero_documents() {
        let scan = MockScan::new(vec![]);
        let closed = scan.closed_handle();
        let mut coordinator = coordinator(scan, MockSink::new());

        let result = coordinator.execute().await.unwrap();
        assert_eq!(result.documents_exported, 0);
        assert_eq!(result.pages, 0);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_prior_pages_only() {
        let scan = MockScan::new(vec![hits(0..100), hits(100..200)]);
        let closed = scan.closed_handle();
        let sink = MockSink::new().failing_at(2);
        let pages = sink.pages_handle();
        let mut coordinator = coordinator(scan, sink);

        let err = coordinator.execute().await.unwrap_err();
        assert!(matches!(
            err,
            EsdumpError::Export(ExportError::WriteFailure(_))
        ));

        // Only the first page made it to the sink, fully and exactly
        let pages = pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 100);

        // The scroll was released on the failed path
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_and_closes_scan() {
        let scan = MockScan::new(vec![hits(0..100), hits(100..200)]).failing_at(2);
        let closed = scan.closed_handle();
        let mut coordinator = coordinator(scan, MockSink::new());

        let err = coordinator.execute().await.unwrap_err();
        assert!(matches!(
            err,
            EsdumpError::Client(ClientError::CursorExpired)
        ));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_page() {
        let scan = MockScan::new(vec![hits(0..100)]);
        let token = CancellationToken::new();
        token.cancel();

        let mut coordinator =
            coordinator(scan, MockSink::new()).with_cancellation(token);

        let result = coordinator.execute().await.unwrap();
        assert!(result.cancelled);
        assert_eq!(result.documents_exported, 0);
    }

    #[tokio::test]
    async fn test_serialized_lines_reach_sink_in_page_order() {
        let scan = MockScan::new(vec![hits(0..2)]);
        let sink = MockSink::new();
        let pages = sink.pages_handle();
        let mut coordinator = coordinator(scan, sink);

        coordinator.execute().await.unwrap();

        let pages = pages.lock().unwrap();
        assert_eq!(
            pages[0],
            vec![
                r#"{"_id":"0","_source":{"n":0}}"#.to_string(),
                r#"{"_id":"1","_source":{"n":1}}"#.to_string(),
            ]
        );
    }
}
