//! Export module for dumping an index to a line-delimited file
//!
//! The dump pipeline is built from four pieces:
//!
//! 1. **StreamingScan**: drains the index through a scroll cursor, one
//!    bounded page per fetch
//! 2. **Record serialization**: turns each record into one
//!    `{"_id", "_source"}` line
//! 3. **PageSink**: appends each serialized page to the dump file as a
//!    unit
//! 4. **ProgressTracker**: real-time feedback while the scan runs
//!
//! The **ExportCoordinator** orchestrates them strictly sequentially; any
//! failed fetch or append is fatal to the job, and already-written pages
//! are never touched again.

pub mod coordinator;
pub mod destination;
pub mod progress;
pub mod record;
pub mod scroll;
pub mod writer;

pub use coordinator::{ExportCoordinator, ExportResult};
pub use progress::ProgressTracker;
pub use scroll::{ScrollScan, StreamingScan};
pub use writer::{DumpWriter, PageSink};

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::EsClient;
use crate::error::Result;

/// The unit of work for one export pass.
///
/// Created once per invocation from job parameters and configuration,
/// immutable afterwards; the pipeline stages borrow it instead of keeping
/// per-stage copies of its fields.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Index to dump
    pub index: String,

    /// Optional mapping type to narrow the dump to
    pub doc_type: Option<String>,

    /// Scroll page size requested per shard
    pub size_per_shard: u32,

    /// Scroll cursor validity window
    pub scroll_ttl: Duration,

    /// Folder the dump file is written into
    pub folder: PathBuf,
}

/// Run one backup job to completion
///
/// Prepares the backup folder, resolves the dump file name from the job
/// start time, then drains the index through the coordinator. The
/// destination file is created lazily on the first written page, so a
/// pre-cursor failure or an empty index leaves nothing on disk.
///
/// # Arguments
/// * `client` - Elasticsearch client
/// * `job` - Export job parameters
/// * `cancel_token` - Cooperative cancellation, honored between pages
/// * `show_progress` - Whether to render a progress bar
///
/// # Returns
/// * `Result<ExportResult>` - Export statistics or the fatal error
pub async fn run_backup(
    client: EsClient,
    job: &ExportJob,
    cancel_token: CancellationToken,
    show_progress: bool,
) -> Result<ExportResult> {
    destination::ensure_backup_folder(&job.folder).await?;

    let path = destination::dump_file_name(
        &job.folder,
        &job.index,
        job.doc_type.as_deref(),
        Local::now(),
    );

    info!("Backing up '{}' to {}", job.index, path.display());
    info!("Backup parameters: sizePerShard={}", job.size_per_shard);

    let scan = ScrollScan::new(
        client,
        job.index.clone(),
        job.doc_type.clone(),
        job.size_per_shard,
        job.scroll_ttl,
    );
    let tracker = ProgressTracker::new(None, show_progress);
    let writer = DumpWriter::new(path);

    let mut coordinator =
        ExportCoordinator::new(Box::new(scan), tracker, Box::new(writer))
            .with_cancellation(cancel_token);
    coordinator.execute().await
}
