//! Chunked fetch-transform stage
//!
//! Pulls a remote feature collection page by page, flattens each feature, and
//! streams one `{"type":"FeatureCollection","features":[...]}` document into
//! a sink.
//!
//! Pagination is strictly sequential: a page's bytes are fully written to the
//! sink before the next page is requested, so feature order in the sink is
//! arrival order. A page with fewer features than the page size (including
//! zero) is the last one.

use crate::adapters::source::FeatureSource;
use crate::core::transform::transform_feature;
use crate::domain::{FetchError, GeoShpError, Result};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use url::Url;

const COLLECTION_PREFIX: &[u8] = br#"{"type":"FeatureCollection","features":["#;
const COLLECTION_SUFFIX: &[u8] = b"]}";

/// Counters for one fetch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Features written
    pub features: usize,
    /// Pages requested
    pub pages: usize,
}

/// Fetch every page of `source_url` into `sink`, then shut the sink down
///
/// # Errors
///
/// Returns [`GeoShpError::Fetch`] on the first network, status, parse or
/// write failure. Whatever was already written stays in the sink.
///
/// # Example
///
/// ```no_run
/// use geoshp::adapters::source::HttpFeatureSource;
/// use geoshp::config::SourceConfig;
/// use geoshp::core::fetch::fetch_collection;
/// use url::Url;
///
/// # async fn example() -> geoshp::domain::Result<()> {
/// let source = HttpFeatureSource::new(SourceConfig::default())?;
/// let url = Url::parse("https://api.example.com/responses.geojson").unwrap();
/// let mut sink = Vec::new();
/// let stats = fetch_collection(&source, &url, 5000, &mut sink).await?;
/// println!("{} features in {} pages", stats.features, stats.pages);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_collection<W>(
    source: &dyn FeatureSource,
    source_url: &Url,
    page_size: usize,
    sink: &mut W,
) -> Result<FetchStats>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if page_size == 0 {
        return Err(GeoShpError::Validation(
            "page size must be greater than 0".to_string(),
        ));
    }

    let mut stats = FetchStats::default();
    let mut opened = false;
    let mut buf = Vec::new();

    loop {
        let start = stats.features;
        let page = source.fetch_page(source_url, start, page_size).await?;
        stats.pages += 1;

        let count = page.count();
        let last = !page.is_full(page_size);

        buf.clear();
        for mut feature in page.features {
            if opened {
                buf.push(b',');
            } else {
                buf.extend_from_slice(COLLECTION_PREFIX);
                opened = true;
            }
            transform_feature(&mut feature);
            serde_json::to_writer(&mut buf, &feature)
                .map_err(|e| FetchError::Write(format!("Failed to serialize feature: {e}")))?;
        }
        write_all(sink, &buf).await?;
        stats.features += count;

        tracing::debug!(
            page = stats.pages,
            start,
            count,
            total = stats.features,
            "Wrote feature page"
        );

        if last {
            break;
        }
    }

    buf.clear();
    if !opened {
        buf.extend_from_slice(COLLECTION_PREFIX);
    }
    buf.extend_from_slice(COLLECTION_SUFFIX);
    write_all(sink, &buf).await?;

    sink.flush()
        .await
        .map_err(|e| FetchError::Write(e.to_string()))?;
    sink.shutdown()
        .await
        .map_err(|e| FetchError::Write(e.to_string()))?;

    Ok(stats)
}

/// Fetch `source_url` into a new file at `path`
///
/// The file must not already exist. On failure the partial file is left in
/// place for the caller to discard.
pub async fn fetch_to_file(
    source: &dyn FeatureSource,
    source_url: &Url,
    page_size: usize,
    path: &Path,
) -> Result<FetchStats> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| FetchError::Write(format!("Failed to create {}: {e}", path.display())))?;

    let mut sink = BufWriter::new(file);
    fetch_collection(source, source_url, page_size, &mut sink).await
}

async fn write_all<W>(sink: &mut W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if bytes.is_empty() {
        return Ok(());
    }
    sink.write_all(bytes)
        .await
        .map_err(|e| FetchError::Write(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Feature, FeaturePage};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// In-memory source serving `total` features, recording every request
    struct VecSource {
        features: Vec<Feature>,
        calls: Mutex<Vec<(usize, usize)>>,
        fail_at: Option<usize>,
    }

    impl VecSource {
        fn new(total: usize) -> Self {
            let features = (0..total)
                .map(|i| {
                    serde_json::from_value(json!({
                        "type": "Feature",
                        "geometry": {"type": "Point", "coordinates": [i, i]},
                        "properties": {"seq": i, "responses": {"q1": format!("a{i}")}}
                    }))
                    .unwrap()
                })
                .collect();
            Self {
                features,
                calls: Mutex::new(Vec::new()),
                fail_at: None,
            }
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeatureSource for VecSource {
        async fn fetch_page(
            &self,
            _source: &Url,
            start: usize,
            count: usize,
        ) -> std::result::Result<FeaturePage, FetchError> {
            self.calls.lock().unwrap().push((start, count));
            if self.fail_at == Some(start) {
                return Err(FetchError::HttpStatus {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let end = (start + count).min(self.features.len());
            let features = self.features.get(start..end).unwrap_or_default().to_vec();
            Ok(FeaturePage { features })
        }
    }

    fn url() -> Url {
        Url::parse("http://source.test/features").unwrap()
    }

    async fn run(source: &VecSource, page_size: usize) -> (FetchStats, Value) {
        let mut sink = Vec::new();
        let stats = fetch_collection(source, &url(), page_size, &mut sink)
            .await
            .unwrap();
        (stats, serde_json::from_slice(&sink).unwrap())
    }

    #[tokio::test]
    async fn test_three_full_pages_and_a_partial() {
        let source = VecSource::new(3 * 4 + 2);
        let (stats, doc) = run(&source, 4).await;

        assert_eq!(stats, FetchStats { features: 14, pages: 4 });
        assert_eq!(source.calls(), vec![(0, 4), (4, 4), (8, 4), (12, 4)]);
        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(doc["features"].as_array().unwrap().len(), 14);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let source = VecSource::new(0);
        let (stats, doc) = run(&source, 5000).await;

        assert_eq!(stats.pages, 1);
        assert_eq!(source.calls().len(), 1);
        assert_eq!(doc, json!({"type": "FeatureCollection", "features": []}));
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_trailing_empty_page() {
        let source = VecSource::new(8);
        let (stats, doc) = run(&source, 4).await;

        assert_eq!(stats, FetchStats { features: 8, pages: 3 });
        assert_eq!(doc["features"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_order_preserved_and_responses_flattened() {
        let source = VecSource::new(11);
        let (_, doc) = run(&source, 3).await;

        for (i, feature) in doc["features"].as_array().unwrap().iter().enumerate() {
            let props = feature["properties"].as_object().unwrap();
            assert_eq!(props["seq"], i);
            assert_eq!(props["r.q1"], format!("a{i}"));
            assert!(!props.contains_key("responses"));
        }
    }

    #[tokio::test]
    async fn test_source_error_terminates_stage() {
        let mut source = VecSource::new(10);
        source.fail_at = Some(4);
        let mut sink = Vec::new();

        let err = fetch_collection(&source, &url(), 4, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, GeoShpError::Fetch(FetchError::HttpStatus { .. })));
        assert_eq!(source.calls().len(), 2);
        // First page was already written; the document is left unterminated
        assert!(serde_json::from_slice::<Value>(&sink).is_err());
    }

    #[tokio::test]
    async fn test_zero_page_size_rejected() {
        let source = VecSource::new(1);
        let mut sink = Vec::new();
        assert!(fetch_collection(&source, &url(), 0, &mut sink).await.is_err());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_to_file_refuses_existing_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(&path, "x").unwrap();

        let source = VecSource::new(1);
        assert!(fetch_to_file(&source, &url(), 10, &path).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }

    #[tokio::test]
    async fn test_fetch_to_file_writes_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("job.json");

        let source = VecSource::new(5);
        let stats = fetch_to_file(&source, &url(), 2, &path).await.unwrap();

        assert_eq!(stats.features, 5);
        let doc: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(doc["features"].as_array().unwrap().len(), 5);
    }
}
