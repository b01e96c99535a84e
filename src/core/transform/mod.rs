//! Feature transformation
//!
//! Features pulled from a source are rewritten before they are written to the
//! intermediate GeoJSON file. Currently the only rewrite is
//! [`flatten::flatten_responses`].

pub mod flatten;

use crate::domain::Feature;

/// Apply every per-feature rewrite, in place
pub fn transform_feature(feature: &mut Feature) {
    flatten::flatten_responses(feature);
}
