//! Filesystem implementation of [`ObjectStore`]
//!
//! Copies archives under a local root. Used by the development profile and by
//! tests that need to observe a delivered object.

use super::ObjectStore;
use crate::domain::{GeoShpError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Directory-backed object store
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
    prefix: String,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`
    pub fn new(root: PathBuf, public_base_url: String, prefix: String) -> Self {
        Self {
            root,
            public_base_url,
            prefix,
        }
    }

    /// Where `remote_key` lives on disk
    ///
    /// # Errors
    ///
    /// Rejects keys that are absolute or contain `..`.
    pub fn object_path(&self, remote_key: &str) -> Result<PathBuf> {
        let key = Path::new(remote_key);
        if key
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(GeoShpError::Upload(format!(
                "Invalid object key: {remote_key}"
            )));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_file(&self, local_path: &Path, remote_key: &str) -> Result<()> {
        let dest = self.object_path(remote_key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GeoShpError::Upload(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        // Copy to a sibling then rename so readers never observe a partial object
        let partial = dest.with_extension("partial");
        tokio::fs::copy(local_path, &partial).await.map_err(|e| {
            GeoShpError::Upload(format!("Failed to copy {}: {e}", local_path.display()))
        })?;
        tokio::fs::rename(&partial, &dest)
            .await
            .map_err(|e| GeoShpError::Upload(format!("Failed to publish {remote_key}: {e}")))?;

        tracing::info!(path = %dest.display(), "Stored archive locally");
        Ok(())
    }

    fn public_url(&self, remote_key: &str) -> String {
        format!("{}/{remote_key}", self.public_base_url.trim_end_matches('/'))
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
