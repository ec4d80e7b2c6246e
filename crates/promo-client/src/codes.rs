//! Durable output for redeemed codes
//!
//! Append-only, one code per line. The engine never rewrites or truncates the
//! file; the only read is at startup, to seed deduplication.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Append-only line store for redeemed codes.
pub trait CodeSink: Send + Sync {
    /// Durably append `code` as one line. Returns only after the write is on disk
    /// (or the implementation's equivalent).
    fn append<'a>(&'a self, code: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// File-backed `CodeSink`.
///
/// Each append opens the file in append mode, writes a single line and syncs
/// data before returning. A tokio Mutex serializes appends so concurrent
/// callers never interleave partial lines.
pub struct FileCodeSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCodeSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }
}

impl CodeSink for FileCodeSink {
    fn append<'a>(&'a self, code: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| Error::Io(format!("opening {}: {e}", self.path.display())))?;

            file.write_all(format!("{code}\n").as_bytes())
                .await
                .map_err(|e| Error::Io(format!("appending to {}: {e}", self.path.display())))?;
            file.sync_data()
                .await
                .map_err(|e| Error::Io(format!("syncing {}: {e}", self.path.display())))?;

            debug!(path = %self.path.display(), "code appended");
            Ok(())
        })
    }
}

/// Read the codes already present in an output file.
///
/// A missing file is a cold start and yields no codes.
pub async fn read_existing_codes(path: &Path) -> Result<Vec<String>> {
    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| Error::Io(format!("checking {}: {e}", path.display())))?
    {
        info!(path = %path.display(), "code file not found, starting with empty output");
        return Ok(Vec::new());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))?;
    let codes: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    info!(path = %path.display(), codes = codes.len(), "loaded existing codes");
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn append_creates_file_and_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");
        let sink = FileCodeSink::new(path.clone());

        sink.append("CODE-1").await.unwrap();
        sink.append("CODE-2").await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "CODE-1\nCODE-2\n");
    }

    #[tokio::test]
    async fn append_never_truncates_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");
        std::fs::write(&path, "OLD\n").unwrap();

        FileCodeSink::new(path.clone()).append("NEW").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "OLD\nNEW\n");
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");
        let sink = Arc::new(FileCodeSink::new(path.clone()));

        let mut handles = Vec::new();
        for i in 0..50 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                sink.append(&format!("CODE-{i:03}")).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = contents.lines().collect();
        lines.sort();
        assert_eq!(lines.len(), 50);
        assert!(lines.iter().all(|l| l.len() == "CODE-000".len()));
        assert_eq!(lines[0], "CODE-000");
        assert_eq!(lines[49], "CODE-049");
    }

    #[tokio::test]
    async fn append_into_missing_directory_fails() {
        let sink = FileCodeSink::new(PathBuf::from("/nonexistent/dir/code.txt"));
        let err = sink.append("X").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn read_existing_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");
        std::fs::write(&path, "A\n\n  B  \nC\n").unwrap();

        let codes = read_existing_codes(&path).await.unwrap();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn read_existing_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let codes = read_existing_codes(&dir.path().join("absent.txt"))
            .await
            .unwrap();
        assert!(codes.is_empty());
    }
}
