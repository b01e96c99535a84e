//! Pagination properties of the fetch stage against a live HTTP server

use geoshp::adapters::source::HttpFeatureSource;
use geoshp::config::{RetryConfig, SourceConfig};
use geoshp::core::fetch::{fetch_collection, fetch_to_file};
use geoshp::domain::{FetchError, GeoShpError};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use test_case::test_case;
use url::Url;

fn source() -> HttpFeatureSource {
    HttpFeatureSource::new(SourceConfig {
        retry: RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 1.0,
        },
        ..Default::default()
    })
    .unwrap()
}

fn page_body(start: usize, count: usize) -> String {
    let features: Vec<Value> = (start..start + count)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [i as f64, 0.0]},
                "properties": {
                    "parcel": i,
                    "responses": {"use-count": i % 3, "collector": "Name"}
                }
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

async fn mock_page(server: &mut ServerGuard, start: usize, page_size: usize, count: usize) -> Mock {
    server
        .mock("GET", "/parcels")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("startIndex".into(), start.to_string()),
            Matcher::UrlEncoded("count".into(), page_size.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page_body(start, count))
        .expect(1)
        .create_async()
        .await
}

/// Serve `total` features in pages of `page_size` and return the mocks
async fn mock_collection(server: &mut ServerGuard, total: usize, page_size: usize) -> Vec<Mock> {
    let mut mocks = Vec::new();
    let mut start = 0;
    loop {
        let count = page_size.min(total - start);
        mocks.push(mock_page(server, start, page_size, count).await);
        if count < page_size {
            break;
        }
        start += count;
    }
    mocks
}

#[test_case(0, 5 ; "empty collection")]
#[test_case(3, 5 ; "single partial page")]
#[test_case(10, 5 ; "exact multiple needs trailing empty page")]
#[test_case(17, 5 ; "three full pages and a partial")]
#[tokio::test]
async fn test_pagination(total: usize, page_size: usize) {
    let mut server = mockito::Server::new_async().await;
    let mocks = mock_collection(&mut server, total, page_size).await;
    let url = Url::parse(&format!("{}/parcels", server.url())).unwrap();

    let mut sink = Vec::new();
    let stats = fetch_collection(&source(), &url, page_size, &mut sink)
        .await
        .unwrap();

    assert_eq!(stats.features, total);
    assert_eq!(stats.pages, total / page_size + 1);
    for mock in mocks {
        mock.assert_async().await;
    }

    let doc: Value = serde_json::from_slice(&sink).unwrap();
    assert_eq!(doc["type"], "FeatureCollection");
    let features = doc["features"].as_array().unwrap();
    assert_eq!(features.len(), total);
    for (i, feature) in features.iter().enumerate() {
        let props = feature["properties"].as_object().unwrap();
        assert_eq!(props["parcel"], i);
        assert_eq!(props["r.use-count"], i % 3);
        assert_eq!(props["r.collector"], "Name");
        assert!(!props.contains_key("responses"));
    }
}

#[tokio::test]
async fn test_http_error_mid_collection_stops_fetching() {
    let mut server = mockito::Server::new_async().await;
    let first = mock_page(&mut server, 0, 2, 2).await;
    let failing = server
        .mock("GET", "/parcels")
        .match_query(Matcher::UrlEncoded("startIndex".into(), "2".into()))
        .with_status(403)
        .expect(1)
        .create_async()
        .await;
    let never = server
        .mock("GET", "/parcels")
        .match_query(Matcher::UrlEncoded("startIndex".into(), "4".into()))
        .expect(0)
        .create_async()
        .await;
    let url = Url::parse(&format!("{}/parcels", server.url())).unwrap();

    let mut sink = Vec::new();
    let err = fetch_collection(&source(), &url, 2, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GeoShpError::Fetch(FetchError::HttpStatus { status: 403, .. })
    ));
    first.assert_async().await;
    failing.assert_async().await;
    never.assert_async().await;
}

#[tokio::test]
async fn test_malformed_page_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/parcels")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;
    let url = Url::parse(&format!("{}/parcels", server.url())).unwrap();

    let mut sink = Vec::new();
    let err = fetch_collection(&source(), &url, 10, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, GeoShpError::Fetch(FetchError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_fetch_to_file_produces_valid_geojson() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_collection(&mut server, 7, 3).await;
    let url = Url::parse(&format!("{}/parcels", server.url())).unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("job.json");

    let stats = fetch_to_file(&source(), &url, 3, &path).await.unwrap();

    assert_eq!(stats.features, 7);
    let doc: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(doc["features"].as_array().unwrap().len(), 7);
}
