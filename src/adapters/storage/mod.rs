//! Object store collaborator
//!
//! Asynchronous delivery only needs "upload the file at P to key K" and "what
//! URL will K be served under". Bucket and prefix are fixed per deployment.

pub mod local;
pub mod s3;

pub use local::LocalObjectStore;
pub use s3::S3ObjectStore;

use crate::config::{ObjectStoreConfig, StorageBackend};
use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Remote store that archives are delivered to
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local_path` to `remote_key`
    ///
    /// # Errors
    ///
    /// Returns [`GeoShpError::Upload`](crate::domain::GeoShpError::Upload) on
    /// any store failure.
    async fn put_file(&self, local_path: &Path, remote_key: &str) -> Result<()>;

    /// Public URL of `remote_key`
    fn public_url(&self, remote_key: &str) -> String;

    /// Key prefix configured for this deployment
    fn prefix(&self) -> &str;
}

/// Build the configured object store
///
/// # Errors
///
/// Returns a configuration error if the backend cannot be constructed.
pub fn create_object_store(config: &ObjectStoreConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        StorageBackend::S3 => Arc::new(S3ObjectStore::new(config)?),
        StorageBackend::Local => Arc::new(LocalObjectStore::new(
            config.local_root.clone(),
            config.public_base_url.clone(),
            config.prefix.clone(),
        )),
    };
    tracing::info!(backend = ?config.backend, "Object store ready");
    Ok(store)
}
