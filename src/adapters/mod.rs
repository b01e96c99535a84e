//! External system integrations.
//!
//! Each collaborator the pipeline depends on sits behind a trait so the core
//! orchestration can be exercised with test doubles:
//!
//! - [`source`] - paginated feature-collection source ([`source::FeatureSource`])
//! - [`converter`] - external conversion program ([`converter::ShapefileConverter`])
//! - [`storage`] - object store for asynchronous delivery ([`storage::ObjectStore`])

pub mod converter;
pub mod source;
pub mod storage;
