//! Per-job scratch paths
//!
//! Every path a job touches is derived from its [`JobId`] under one root:
//!
//! - `<root>/<id>.json` - the GeoJSON input
//! - `<root>/<id>/` - the scratch workspace the converter writes into
//! - `<root>/<id>_<basename>.zip` - the locally materialized archive
//!
//! Two jobs never share an id, so no locking is needed between them.

use crate::domain::{BaseName, GeoShpError, JobId, Result};
use crate::log_cleanup_failure;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Scratch paths owned by one job
#[derive(Debug, Clone)]
pub struct JobPaths {
    job_id: JobId,
    root: PathBuf,
}

impl JobPaths {
    /// Paths for `job_id` under `root`
    pub fn new(root: impl Into<PathBuf>, job_id: JobId) -> Self {
        Self {
            job_id,
            root: root.into(),
        }
    }

    /// Owning job
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// `<root>/<id>.json`
    pub fn input_json(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.job_id))
    }

    /// `<root>/<id>/`
    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(self.job_id.as_str())
    }

    /// `<root>/<id>_<basename>.zip`
    pub fn local_archive(&self, base_name: &BaseName) -> PathBuf {
        self.root
            .join(format!("{}_{}", self.job_id, base_name.archive_file_name()))
    }

    /// Create the scratch workspace
    ///
    /// The directory must not exist yet; an existing one is never reused.
    ///
    /// # Errors
    ///
    /// Returns [`GeoShpError::WorkspaceCreation`] on collision or permission
    /// failure.
    pub async fn create_workspace(&self) -> Result<PathBuf> {
        let dir = self.workspace_dir();
        tokio::fs::create_dir(&dir).await.map_err(|e| {
            GeoShpError::WorkspaceCreation(format!("{}: {e}", dir.display()))
        })?;
        tracing::debug!(job_id = %self.job_id, path = %dir.display(), "Created workspace");
        Ok(dir)
    }

    /// Files the converter left in the workspace, sorted by name
    ///
    /// # Errors
    ///
    /// Returns [`GeoShpError::Archive`] if the workspace cannot be read.
    pub async fn workspace_entries(&self) -> Result<Vec<PathBuf>> {
        let dir = self.workspace_dir();
        let read_err =
            |e: std::io::Error| GeoShpError::Archive(format!("Failed to read {}: {e}", dir.display()));

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await.map_err(read_err)?;
        while let Some(entry) = reader.next_entry().await.map_err(read_err)? {
            if entry.file_type().await.map_err(read_err)?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Remove the workspace and the input file
    ///
    /// Both removals are attempted even if the first fails. Failures are
    /// logged; the first one is returned.
    pub async fn cleanup(&self) -> Result<()> {
        let workspace = remove_dir(&self.workspace_dir()).await;
        let input = remove_file(&self.input_json()).await;

        for (path, outcome) in [
            (self.workspace_dir(), &workspace),
            (self.input_json(), &input),
        ] {
            if let Err(e) = outcome {
                log_cleanup_failure!(self.job_id, path.display(), e);
            }
        }

        workspace.and(input)
    }

    /// Remove the local archive for `base_name`
    pub async fn remove_local_archive(&self, base_name: &BaseName) -> Result<()> {
        let path = self.local_archive(base_name);
        let outcome = remove_file(&path).await;
        if let Err(e) = &outcome {
            log_cleanup_failure!(self.job_id, path.display(), e);
        }
        outcome
    }
}

async fn remove_dir(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GeoShpError::Cleanup(format!("{}: {e}", path.display()))),
    }
}

async fn remove_file(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GeoShpError::Cleanup(format!("{}: {e}", path.display()))),
    }
}
