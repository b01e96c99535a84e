//! Paginated feature-collection source
//!
//! The fetch stage only needs "give me the page starting at offset N". The
//! [`FeatureSource`] trait isolates that from the HTTP details so the stage
//! can be driven by a test double.

pub mod http;

pub use http::HttpFeatureSource;

use crate::domain::{FeaturePage, FetchError};
use async_trait::async_trait;
use url::Url;

/// A remote feature collection that can be read page by page
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetch `count` features starting at zero-based offset `start`
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on network failure, non-success status, or a
    /// body that is not a feature collection.
    async fn fetch_page(
        &self,
        source: &Url,
        start: usize,
        count: usize,
    ) -> std::result::Result<FeaturePage, FetchError>;
}
