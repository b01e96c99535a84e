//! Response flattening
//!
//! Survey-style sources nest answers under a `responses` property. Shapefile
//! attribute tables cannot hold nested maps, so each `responses.<key>` is
//! lifted to a top-level `r.<key>` property and `responses` itself is
//! removed.

use crate::domain::Feature;
use serde_json::{Map, Value};

/// Property holding the nested response map
pub const RESPONSES_KEY: &str = "responses";

/// Prefix given to every lifted response key
pub const RESPONSE_PREFIX: &str = "r.";

/// Flatten a feature's `responses` map into prefixed top-level properties
///
/// A `responses` value that is not an object is dropped. A lifted key
/// overwrites an existing property of the same name.
///
/// # Examples
///
/// ```
/// use geoshp::core::transform::flatten::flatten_responses;
/// use geoshp::domain::Feature;
/// use serde_json::json;
///
/// let mut feature: Feature = serde_json::from_value(json!({
///     "type": "Feature",
///     "geometry": null,
///     "properties": {"parcel_id": "1", "responses": {"site": "parking-lot"}}
/// })).unwrap();
///
/// flatten_responses(&mut feature);
/// assert_eq!(feature.properties["r.site"], "parking-lot");
/// assert!(!feature.properties.contains_key("responses"));
/// ```
pub fn flatten_responses(feature: &mut Feature) {
    if let Some(responses) = feature.properties.remove(RESPONSES_KEY) {
        lift_into(&mut feature.properties, responses);
    }
}

fn lift_into(properties: &mut Map<String, Value>, responses: Value) {
    if let Value::Object(map) = responses {
        for (key, value) in map {
            properties.insert(prefixed_key(&key), value);
        }
    }
}

/// `r.` + original key
fn prefixed_key(key: &str) -> String {
    format!("{RESPONSE_PREFIX}{key}")
}
