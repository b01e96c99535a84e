//! Conversion orchestrator
//!
//! Turns a GeoJSON file into a streaming archive:
//!
//! 1. create the job's scratch workspace
//! 2. run the external converter against it
//! 3. enumerate the produced files
//! 4. start the archive and hand its stream back immediately
//!
//! Finalization runs in the background. Once the archive is complete, an
//! oversized result is reported and the workspace plus the input file are
//! removed. Cleanup failures are logged and never reach the caller.

use crate::adapters::converter::ShapefileConverter;
use crate::config::ArchiveConfig;
use crate::core::archive::{exceeds_threshold, spawn_archive, ArchiveEntry, ArchiveStream};
use crate::core::workspace::JobPaths;
use crate::domain::{GeoShpError, Result};
use crate::log_large_archive;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Archive stream plus its eventual outcome
pub struct Conversion {
    /// Archive bytes, available before finalization
    pub archive: ArchiveStream,

    /// Background finalization and cleanup
    pub finished: Finalization,
}

/// Outcome of a conversion's background finalization
pub struct Finalization(oneshot::Receiver<Result<u64>>);

impl Finalization {
    /// Wait until the archive is finalized and scratch files are removed
    ///
    /// Returns the total archive bytes.
    ///
    /// # Errors
    ///
    /// Returns the archive error, or an archive error if the background task
    /// vanished without reporting.
    pub async fn wait(self) -> Result<u64> {
        self.0.await.map_err(|_| {
            GeoShpError::Archive("Archive finalization was dropped".to_string())
        })?
    }
}

/// Drives one GeoJSON file through conversion and packaging
#[derive(Clone)]
pub struct ConversionOrchestrator {
    converter: Arc<dyn ShapefileConverter>,
    archive: ArchiveConfig,
}

impl ConversionOrchestrator {
    /// Create an orchestrator around `converter`
    pub fn new(converter: Arc<dyn ShapefileConverter>, archive: ArchiveConfig) -> Self {
        Self { converter, archive }
    }

    /// Convert the job's input file
    ///
    /// `paths.input_json()` must already hold the GeoJSON document.
    ///
    /// # Errors
    ///
    /// Returns a workspace creation, conversion or archive error. On those
    /// paths the workspace and input are removed on a best-effort basis
    /// before the error is returned.
    pub async fn convert(&self, paths: &JobPaths) -> Result<Conversion> {
        let job_id = paths.job_id().clone();

        let workspace = paths.create_workspace().await?;

        let prepared = async {
            self.converter
                .convert(&paths.input_json(), &workspace)
                .await?;
            paths
                .workspace_entries()
                .await?
                .into_iter()
                .map(ArchiveEntry::from_path)
                .collect::<Result<Vec<_>>>()
        }
        .await;

        let entries = match prepared {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Conversion failed");
                let _ = paths.cleanup().await;
                return Err(e);
            }
        };

        tracing::info!(
            job_id = %job_id,
            entries = entries.len(),
            "Conversion produced outputs"
        );

        let (archive, task) = spawn_archive(entries, self.archive.chunk_capacity);
        let (done_tx, finished) = oneshot::channel();
        let threshold = self.archive.large_file_threshold_bytes;
        let paths = paths.clone();

        tokio::spawn(async move {
            let outcome = task.finalized().await;
            match &outcome {
                Ok(total) => {
                    tracing::debug!(job_id = %job_id, bytes = total, "Archive finalized");
                    if exceeds_threshold(*total, threshold) {
                        log_large_archive!(job_id, *total, threshold);
                    }
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "Archive failed");
                }
            }

            // Failures are logged inside cleanup
            let _ = paths.cleanup().await;
            let _ = done_tx.send(outcome);
        });

        Ok(Conversion {
            archive,
            finished: Finalization(finished),
        })
    }
}
