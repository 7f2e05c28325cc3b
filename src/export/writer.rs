//! Dump file writer for export operations
//!
//! Pages are appended as units: either every line of a page lands in the
//! file or the append reports a write failure and the job aborts. The file
//! is created lazily on the first written page, so an empty export leaves
//! nothing on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{ExportError, Result};

/// Trait for appending serialized pages to a destination
#[async_trait]
pub trait PageSink: Send {
    /// Append one page of lines as a unit
    ///
    /// # Arguments
    /// * `lines` - Serialized records in page order
    ///
    /// # Returns
    /// * `Result<usize>` - Number of records appended
    async fn append_page(&mut self, lines: &[String]) -> Result<usize>;

    /// Finalize the output (flush buffers, sync to storage)
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    async fn finalize(&mut self) -> Result<()>;

    /// Get the current file size in bytes (0 when no file was created)
    ///
    /// # Returns
    /// * `Result<u64>` - File size in bytes
    async fn file_size(&self) -> Result<u64>;
}

/// Line-delimited dump file writer
///
/// Lines within a page are joined by a single line break; consecutive
/// pages are separated by exactly one line break, and the file never ends
/// with one. The line-break count of a finished dump therefore equals its
/// record count minus one.
pub struct DumpWriter {
    /// Destination path
    path: PathBuf,

    /// Open file handle, created on the first appended page
    file: Option<File>,

    /// Number of records written so far
    written: u64,
}

impl DumpWriter {
    /// Create a new dump writer for a destination path
    ///
    /// The file itself is not created until the first page is appended.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            file: None,
            written: 0,
        }
    }

    /// Destination path of this writer
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    async fn open_file(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| {
                    ExportError::WriteFailure(format!(
                        "cannot open {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
            debug!("Created dump file {}", self.path.display());
            self.file = Some(file);
        }
        Ok(self.file.as_mut().unwrap())
    }
}

#[async_trait]
impl PageSink for DumpWriter {
    async fn append_page(&mut self, lines: &[String]) -> Result<usize> {
        if lines.is_empty() {
            return Ok(0);
        }

        // Assemble the whole page in memory first so the file sees exactly
        // one append per page.
        let mut block = String::with_capacity(
            lines.iter().map(|l| l.len() + 1).sum::<usize>(),
        );
        if self.written > 0 {
            block.push('\n');
        }
        block.push_str(&lines.join("\n"));

        let path = self.path.clone();
        let file = self.open_file().await?;
        file.write_all(block.as_bytes()).await.map_err(|e| {
            ExportError::WriteFailure(format!("append to {} failed: {}", path.display(), e))
        })?;
        file.flush().await.map_err(|e| {
            ExportError::WriteFailure(format!("flush of {} failed: {}", path.display(), e))
        })?;

        self.written += lines.len() as u64;
        debug!(
            "Appended page of {} lines (total: {})",
            lines.len(),
            self.written
        );
        Ok(lines.len())
    }

    async fn finalize(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush().await.map_err(|e| {
                ExportError::WriteFailure(format!(
                    "flush of {} failed: {}",
                    self.path.display(),
                    e
                ))
            })?;
            file.sync_all().await.map_err(|e| {
                ExportError::WriteFailure(format!(
                    "sync of {} failed: {}",
                    self.path.display(),
                    e
                ))
            })?;
            debug!(
                "Finalized dump file {} ({} records)",
                self.path.display(),
                self.written
            );
        }
        Ok(())
    }

    async fn file_size(&self) -> Result<u64> {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(_) => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::fs;

    #[tokio::test]
    async fn test_file_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders-dump.json");

        let mut writer = DumpWriter::new(&path);
        assert!(!path.exists());
        assert_eq!(writer.file_size().await.unwrap(), 0);

        writer
            .append_page(&["{\"_id\":\"1\"}".to_string()])
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_empty_page_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty-dump.json");

        let mut writer = DumpWriter::new(&path);
        assert_eq!(writer.append_page(&[]).await.unwrap(), 0);
        writer.finalize().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_pages_are_separated_by_single_line_break() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages-dump.json");

        let mut writer = DumpWriter::new(&path);
        writer
            .append_page(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        writer.append_page(&["c".to_string()]).await.unwrap();
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "a\nb\nc");
    }

    #[tokio::test]
    async fn test_line_break_count_is_records_minus_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("count-dump.json");

        let mut writer = DumpWriter::new(&path);
        for page in [vec!["1", "2", "3"], vec!["4"], vec!["5", "6"]] {
            let lines: Vec<String> = page.into_iter().map(String::from).collect();
            writer.append_page(&lines).await.unwrap();
        }
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        let breaks = content.matches('\n').count();
        assert_eq!(writer.written(), 6);
        assert_eq!(breaks, 5);
        assert!(!content.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_append_into_missing_directory_fails() {
        let mut writer = DumpWriter::new("/nonexistent/folder/dump.json");
        let err = writer
            .append_page(&["x".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EsdumpError::Export(ExportError::WriteFailure(_))
        ));
    }
}
