//! HTTP implementation of [`FeatureSource`]
//!
//! Each page is a `GET` against the source URL with the start offset and page
//! size appended as query parameters (`startIndex`/`count` by default).

use super::FeatureSource;
use crate::config::SourceConfig;
use crate::domain::{FeaturePage, FetchError, GeoShpError, Result};
use crate::log_retry_attempt;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;

/// reqwest-backed paginated source
///
/// # Example
///
/// ```no_run
/// use geoshp::adapters::source::{FeatureSource, HttpFeatureSource};
/// use geoshp::config::SourceConfig;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpFeatureSource::new(SourceConfig::default())?;
/// let url = Url::parse("https://api.example.com/surveys/1/responses.geojson")?;
/// let page = source.fetch_page(&url, 0, 5000).await?;
/// println!("{} features", page.count());
/// # Ok(())
/// # }
/// ```
pub struct HttpFeatureSource {
    client: Client,
    config: SourceConfig,
}

impl HttpFeatureSource {
    /// Create a new source client
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("geoshp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoShpError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// URL of the page starting at `start`
    pub fn page_url(&self, source: &Url, start: usize, count: usize) -> Url {
        let mut url = source.clone();
        url.query_pairs_mut()
            .append_pair(&self.config.start_param, &start.to_string())
            .append_pair(&self.config.count_param, &count.to_string());
        url
    }

    async fn request_page(&self, url: &Url) -> std::result::Result<FeaturePage, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::ConnectionFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: body.chars().take(512).collect(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::ConnectionFailed(e.to_string()))?;

        serde_json::from_slice::<FeaturePage>(&bytes)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    /// Retry a request with exponential backoff
    ///
    /// Only transient failures (connection errors, 429 and 5xx) are retried.
    async fn retry_request(&self, url: &Url) -> std::result::Result<FeaturePage, FetchError> {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            match self.request_page(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    attempt += 1;
                    if attempt >= retry.max_retries || !e.is_retryable() {
                        return Err(e);
                    }

                    let delay_ms = (retry.initial_delay_ms as f64
                        * retry.backoff_multiplier.powi((attempt - 1) as i32))
                        as u64;
                    let delay_ms = delay_ms.min(retry.max_delay_ms);

                    log_retry_attempt!(attempt, retry.max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl FeatureSource for HttpFeatureSource {
    async fn fetch_page(
        &self,
        source: &Url,
        start: usize,
        count: usize,
    ) -> std::result::Result<FeaturePage, FetchError> {
        let url = self.page_url(source, start, count);
        tracing::debug!(url = %url, start, count, "Fetching feature page");
        self.retry_request(&url).await
    }
}
