//! Conversion pipeline.
//!
//! # Modules
//!
//! - [`transform`] - Per-feature property flattening
//! - [`fetch`] - Paginated fetch of a remote collection into one GeoJSON file
//! - [`workspace`] - Per-job scratch paths, creation and cleanup
//! - [`archive`] - Streaming zip packaging of converter outputs
//! - [`convert`] - Conversion orchestration around the external program
//! - [`delivery`] - Synchronous and asynchronous delivery of the archive
//!
//! # Job Workflow
//!
//! 1. **Fetch** (asynchronous delivery only): page through the source into
//!    `<root>/<id>.json`, flattening `responses` on every feature
//! 2. **Convert**: run the converter inside `<root>/<id>/`
//! 3. **Archive**: zip the workspace entries in name order
//! 4. **Deliver**: stream the archive to the client, or drain it to
//!    `<root>/<id>_<basename>.zip` and upload it
//! 5. **Clean up**: remove the workspace, the input and the local archive
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use geoshp::adapters::converter::CommandConverter;
//! use geoshp::config::load_config;
//! use geoshp::core::convert::ConversionOrchestrator;
//! use geoshp::core::delivery::DirectDelivery;
//! use geoshp::domain::BaseName;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("geoshp.toml")?;
//!
//! let converter = Arc::new(CommandConverter::new(config.conversion.clone()));
//! let orchestrator = ConversionOrchestrator::new(converter, config.archive.clone());
//! let delivery = DirectDelivery::new(orchestrator, config.workspace.root.clone());
//!
//! let body = Bytes::from(std::fs::read("parcels.geojson")?);
//! let job = delivery.handle(body, BaseName::default()).await?;
//! job.archive.drain_to_file(std::path::Path::new("parcels.zip")).await?;
//! let report = job.report.await?;
//! println!("{}: {}", report.job_id, report.state);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod convert;
pub mod delivery;
pub mod fetch;
pub mod transform;
pub mod workspace;
