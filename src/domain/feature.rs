//! GeoJSON feature model
//!
//! Only the parts of a feature the pipeline touches are typed: the property
//! map. Geometry and any foreign members pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single GeoJSON feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// GeoJSON object type, always `"Feature"` for well-formed input
    #[serde(rename = "type", default = "default_feature_type")]
    pub kind: String,

    /// Geometry object, serialized verbatim
    #[serde(default)]
    pub geometry: Value,

    /// Property map
    #[serde(default, deserialize_with = "properties_or_empty")]
    pub properties: Map<String, Value>,

    /// Foreign members (`id`, `bbox`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_feature_type() -> String {
    "Feature".to_string()
}

// `"properties": null` is legal GeoJSON
fn properties_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of a paginated feature collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeaturePage {
    /// Features in arrival order
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeaturePage {
    /// Number of features on this page
    pub fn count(&self) -> usize {
        self.features.len()
    }

    /// Whether this page is full, meaning another page must be requested
    pub fn is_full(&self, page_size: usize) -> bool {
        self.count() == page_size
    }

    /// Whether this page has no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_deserialize_keeps_foreign_members() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": 7,
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            "properties": {"name": "a"}
        }))
        .unwrap();

        assert_eq!(feature.kind, "Feature");
        assert_eq!(feature.properties["name"], "a");
        assert_eq!(feature.extra["id"], 7);

        let back = serde_json::to_value(&feature).unwrap();
        assert_eq!(back["id"], 7);
        assert_eq!(back["geometry"]["type"], "Point");
    }

    #[test]
    fn test_feature_null_properties() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": null,
            "properties": null
        }))
        .unwrap();
        assert!(feature.properties.is_empty());
    }

    #[test]
    fn test_page_fullness() {
        let page: FeaturePage = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {}},
                {"type": "Feature", "geometry": null, "properties": {}}
            ]
        }))
        .unwrap();

        assert_eq!(page.count(), 2);
        assert!(page.is_full(2));
        assert!(!page.is_full(3));
        assert!(!page.is_empty());
    }

    #[test]
    fn test_page_missing_features_is_empty() {
        let page: FeaturePage = serde_json::from_str(r#"{"type":"FeatureCollection"}"#).unwrap();
        assert!(page.is_empty());
        assert!(!page.is_full(5000));
    }
}
