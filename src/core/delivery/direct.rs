//! Synchronous delivery

use crate::core::archive::ArchiveStream;
use crate::core::convert::{Conversion, ConversionOrchestrator};
use crate::core::workspace::JobPaths;
use crate::domain::{BaseName, GeoShpError, JobId, JobReport, JobState, Result};
use crate::log_job_finished;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

/// A running synchronous job
pub struct DirectJob {
    /// Archive bytes, available before finalization
    pub archive: ArchiveStream,
    /// Resolves with the final report once the archive is finalized and
    /// scratch files are removed
    pub report: JoinHandle<JobReport>,
}

/// Converts a request body and streams the archive back
#[derive(Clone)]
pub struct DirectDelivery {
    orchestrator: ConversionOrchestrator,
    workspace_root: PathBuf,
}

impl DirectDelivery {
    /// Create a direct delivery orchestrator writing scratch files under
    /// `workspace_root`
    pub fn new(orchestrator: ConversionOrchestrator, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            workspace_root: workspace_root.into(),
        }
    }

    /// Persist `body`, convert it and return the archive stream
    ///
    /// The job report is completed and logged in the background once the
    /// archive is finalized. Awaiting [`DirectJob::report`] is optional; a
    /// dropped handle leaves the job running detached.
    ///
    /// # Errors
    ///
    /// Any failure before the first archive byte is returned here; the caller
    /// turns it into a server error response.
    pub async fn handle(&self, body: Bytes, base_name: BaseName) -> Result<DirectJob> {
        let job_id = JobId::generate();
        let paths = JobPaths::new(&self.workspace_root, job_id.clone());
        let mut report = JobReport::new(job_id, base_name);

        tracing::info!(
            job_id = %report.job_id,
            base_name = %report.base_name,
            body_bytes = body.len(),
            "Direct conversion requested"
        );

        let conversion = match self.prepare(&paths, &body, &mut report).await {
            Ok(conversion) => conversion,
            Err(e) => {
                report.fail(&e);
                let _ = paths.cleanup().await;
                log_job_finished!(report);
                return Err(e);
            }
        };

        let finished = conversion.finished;
        let report = tokio::spawn(async move {
            match finished.wait().await {
                Ok(total) => {
                    report.archive_bytes = Some(total);
                    let done = report
                        .advance(JobState::CleaningUp)
                        .and_then(|()| report.advance(JobState::Done));
                    if let Err(e) = done {
                        report.fail(&e);
                    }
                }
                Err(e) => report.fail(&e),
            }
            log_job_finished!(report);
            report
        });

        Ok(DirectJob {
            archive: conversion.archive,
            report,
        })
    }

    async fn prepare(
        &self,
        paths: &JobPaths,
        body: &[u8],
        report: &mut JobReport,
    ) -> Result<Conversion> {
        write_input(paths, body).await?;

        report.advance(JobState::Converting)?;
        let conversion = self.orchestrator.convert(paths).await?;

        report.advance(JobState::Archiving)?;
        report.advance(JobState::Streaming)?;
        Ok(conversion)
    }
}

async fn write_input(paths: &JobPaths, body: &[u8]) -> Result<()> {
    let path = paths.input_json();
    let write_err = |e: std::io::Error| {
        GeoShpError::Io(format!("Failed to write {}: {e}", path.display()))
    };

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(write_err)?;
    file.write_all(body).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    Ok(())
}
