//! Amazon S3 implementation of [`ObjectStore`]

use super::ObjectStore;
use crate::config::ObjectStoreConfig;
use crate::domain::{GeoShpError, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use secrecy::ExposeSecret;
use std::path::Path;

/// S3 object store with static credentials
///
/// Objects are written `public-read` so the announced URL
/// `http://<bucket>.s3.amazonaws.com/<key>` resolves once the upload lands.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3ObjectStore {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if credentials are missing.
    pub fn new(config: &ObjectStoreConfig) -> Result<Self> {
        let (access_key_id, secret_access_key) =
            match (&config.access_key_id, &config.secret_access_key) {
                (Some(id), Some(secret)) => (
                    id.expose_secret().as_ref().to_string(),
                    secret.expose_secret().as_ref().to_string(),
                ),
                _ => {
                    return Err(GeoShpError::Configuration(
                        "S3 object store requires access_key_id and secret_access_key".to_string(),
                    ))
                }
            };

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "geoshp");

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(&self, local_path: &Path, remote_key: &str) -> Result<()> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            GeoShpError::Upload(format!("Failed to open {}: {e}", local_path.display()))
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(remote_key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type("application/zip")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                GeoShpError::Upload(format!(
                    "PutObject s3://{}/{remote_key} failed: {e}",
                    self.bucket
                ))
            })?;

        tracing::info!(bucket = %self.bucket, key = %remote_key, "Uploaded archive to S3");
        Ok(())
    }

    fn public_url(&self, remote_key: &str) -> String {
        s3_public_url(&self.bucket, remote_key)
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// `http://<bucket>.s3.amazonaws.com/<key>`
pub fn s3_public_url(bucket: &str, key: &str) -> String {
    format!("http://{bucket}.s3.amazonaws.com/{key}")
}
