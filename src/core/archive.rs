//! Streaming zip archive
//!
//! Entries are appended by a zip stream writer on a blocking thread. Its
//! output goes through a bounded channel, so the consumer receives bytes
//! while later entries are still being compressed and memory stays bounded
//! by the channel capacity. Nothing ever needs to seek.
//!
//! The consumer is either an HTTP response body
//! ([`ArchiveStream::into_body_stream`]) or a local file
//! ([`ArchiveStream::drain_to_file`]). Finalization is reported separately
//! through the [`ArchiveTask`] handle.

use crate::domain::{GeoShpError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CHUNK_BYTES: usize = 64 * 1024;

/// One file to place in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name inside the archive
    pub name: String,
    /// File on disk providing the bytes
    pub path: PathBuf,
}

impl ArchiveEntry {
    /// Entry named after the base file name of `path`
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                GeoShpError::Archive(format!("Unusable entry name: {}", path.display()))
            })?
            .to_string();
        Ok(Self { name, path })
    }
}

/// Archive bytes in production order
///
/// A failed archive yields one final `Err` item instead of ending cleanly, so
/// a consumer never mistakes a truncated archive for a complete one.
pub struct ArchiveStream {
    inner: ReceiverStream<io::Result<Bytes>>,
}

impl ArchiveStream {
    /// Stream suitable for an HTTP response body
    pub fn into_body_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        self.inner
    }

    /// Write the whole archive to a new file at `path`
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`GeoShpError::Archive`] if the archive fails or the file
    /// cannot be written.
    pub async fn drain_to_file(mut self, path: &Path) -> Result<u64> {
        let file_err =
            |e: io::Error| GeoShpError::Archive(format!("{}: {e}", path.display()));

        let mut file = tokio::fs::File::create(path).await.map_err(file_err)?;
        let mut written = 0u64;
        while let Some(chunk) = self.inner.next().await {
            let chunk = chunk.map_err(|e| GeoShpError::Archive(e.to_string()))?;
            file.write_all(&chunk).await.map_err(file_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(file_err)?;
        file.sync_all().await.map_err(file_err)?;
        Ok(written)
    }

    /// Collect the whole archive in memory
    pub async fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.inner.next().await {
            out.extend_from_slice(&chunk.map_err(|e| GeoShpError::Archive(e.to_string()))?);
        }
        Ok(out)
    }
}

impl Stream for ArchiveStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Handle to the archive writer
pub struct ArchiveTask {
    handle: JoinHandle<Result<u64>>,
}

impl ArchiveTask {
    /// Wait for finalization; returns the total archive bytes
    ///
    /// # Errors
    ///
    /// Returns [`GeoShpError::Archive`] if any append or the finalize step
    /// failed, including when the consumer went away early.
    pub async fn finalized(self) -> Result<u64> {
        self.handle
            .await
            .map_err(|e| GeoShpError::Archive(format!("Archive task aborted: {e}")))?
    }
}

/// Start writing `entries`, in order, into a new archive
///
/// `capacity` is the number of chunks buffered ahead of the consumer.
pub fn spawn_archive(entries: Vec<ArchiveEntry>, capacity: usize) -> (ArchiveStream, ArchiveTask) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::task::spawn_blocking(move || {
        let total = Arc::new(AtomicU64::new(0));
        let writer = ChannelWriter::new(tx.clone(), Arc::clone(&total));

        match write_entries(writer, &entries) {
            Ok(()) => Ok(total.load(Ordering::Acquire)),
            Err(e) => {
                // Consumer may already be gone
                let _ = tx.blocking_send(Err(io::Error::other(e.to_string())));
                Err(e)
            }
        }
    });

    (
        ArchiveStream {
            inner: ReceiverStream::new(rx),
        },
        ArchiveTask { handle },
    )
}

/// Whether an archive of `bytes` should be reported as large
pub fn exceeds_threshold(bytes: u64, threshold: u64) -> bool {
    bytes > threshold
}

fn write_entries(writer: ChannelWriter, entries: &[ArchiveEntry]) -> Result<()> {
    let mut zip = ZipWriter::new_stream(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        let mut file = File::open(&entry.path).map_err(|e| {
            GeoShpError::Archive(format!("Failed to open {}: {e}", entry.path.display()))
        })?;
        zip.start_file(entry.name.as_str(), options)
            .map_err(|e| GeoShpError::Archive(format!("Failed to add {}: {e}", entry.name)))?;
        io::copy(&mut file, &mut zip)
            .map_err(|e| GeoShpError::Archive(format!("Failed to write {}: {e}", entry.name)))?;
        tracing::trace!(entry = %entry.name, "Appended archive entry");
    }

    let mut inner = zip
        .finish()
        .map_err(|e| GeoShpError::Archive(format!("Failed to finalize archive: {e}")))?;
    inner
        .flush()
        .map_err(|e| GeoShpError::Archive(format!("Failed to finalize archive: {e}")))?;
    Ok(())
}

/// `Write` adapter that forwards bytes to an async channel in chunks
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
    buf: Vec<u8>,
    total: Arc<AtomicU64>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<io::Result<Bytes>>, total: Arc<AtomicU64>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(CHUNK_BYTES),
            total,
        }
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(
            &mut self.buf,
            Vec::with_capacity(CHUNK_BYTES),
        ));
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive consumer dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.total.fetch_add(data.len() as u64, Ordering::AcqRel);
        if self.buf.len() >= CHUNK_BYTES {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        let _ = self.send_buffered();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;

    fn write_files(dir: &Path, files: &[(&str, &[u8])]) -> Vec<ArchiveEntry> {
        files
            .iter()
            .map(|(name, data)| {
                let path = dir.join(name);
                std::fs::write(&path, data).unwrap();
                ArchiveEntry::from_path(path).unwrap()
            })
            .collect()
    }

    fn read_back(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_entries_round_trip_in_order() {
        let dir = TempDir::new().unwrap();
        let shp: Vec<u8> = (0..200_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let entries = write_files(
            dir.path(),
            &[("a.shp", &shp), ("a.dbf", b"dbf-bytes"), ("a.shx", b"shx")],
        );

        let (stream, task) = spawn_archive(entries, 4);
        let bytes = stream.into_bytes().await.unwrap();
        let total = task.finalized().await.unwrap();

        assert_eq!(total, bytes.len() as u64);
        let contents = read_back(bytes);
        assert_eq!(
            contents,
            vec![
                ("a.shp".to_string(), shp),
                ("a.dbf".to_string(), b"dbf-bytes".to_vec()),
                ("a.shx".to_string(), b"shx".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_archive_is_valid() {
        let (stream, task) = spawn_archive(Vec::new(), 1);
        let bytes = stream.into_bytes().await.unwrap();

        assert!(task.finalized().await.unwrap() > 0);
        assert!(read_back(bytes).is_empty());
    }

    #[tokio::test]
    async fn test_missing_entry_fails_stream_and_task() {
        let dir = TempDir::new().unwrap();
        let entries = vec![ArchiveEntry {
            name: "gone.shp".to_string(),
            path: dir.path().join("gone.shp"),
        }];

        let (stream, task) = spawn_archive(entries, 1);
        assert!(stream.into_bytes().await.is_err());
        assert!(matches!(task.finalized().await, Err(GeoShpError::Archive(_))));
    }

    #[tokio::test]
    async fn test_dropped_consumer_fails_task() {
        let dir = TempDir::new().unwrap();
        let big: Vec<u8> = (0..2_000_000u32)
            .flat_map(|i| i.wrapping_mul(2_654_435_761).to_le_bytes())
            .collect();
        let entries = write_files(dir.path(), &[("big.dbf", &big)]);

        let (stream, task) = spawn_archive(entries, 1);
        drop(stream);
        assert!(task.finalized().await.is_err());
    }

    #[tokio::test]
    async fn test_drain_to_file() {
        let dir = TempDir::new().unwrap();
        let entries = write_files(dir.path(), &[("a.prj", b"GEOGCS")]);
        let target = dir.path().join("out.zip");

        let (stream, task) = spawn_archive(entries, 2);
        let written = stream.drain_to_file(&target).await.unwrap();

        assert_eq!(written, task.finalized().await.unwrap());
        let contents = read_back(std::fs::read(&target).unwrap());
        assert_eq!(contents[0].0, "a.prj");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let limit = 20 * 1024 * 1024;
        assert!(!exceeds_threshold(limit, limit));
        assert!(!exceeds_threshold(limit - 1, limit));
        assert!(exceeds_threshold(limit + 1, limit));
    }

    #[test]
    fn test_entry_name_is_base_name() {
        let entry = ArchiveEntry::from_path(PathBuf::from("/tmp/job/shapefile.dbf")).unwrap();
        assert_eq!(entry.name, "shapefile.dbf");
    }
}
