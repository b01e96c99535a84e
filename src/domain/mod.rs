//! Domain models and types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`JobId`], [`BaseName`]) that namespace every artifact of a job
//! - **GeoJSON model** ([`Feature`], [`FeaturePage`])
//! - **Job lifecycle** ([`JobState`], [`JobReport`]) and [`DeliveryTarget`]
//! - **Error types** ([`GeoShpError`], [`FetchError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, GeoShpError>`]:
//!
//! ```rust
//! use geoshp::domain::{GeoShpError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = geoshp::config::load_config("geoshp.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod feature;
pub mod ids;
pub mod job;
pub mod result;
pub mod target;

pub use errors::{FetchError, GeoShpError};
pub use feature::{Feature, FeaturePage};
pub use ids::{BaseName, JobId};
pub use job::{JobReport, JobState};
pub use result::Result;
pub use target::DeliveryTarget;
