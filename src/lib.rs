// geoshp - GeoJSON to Shapefile conversion service
// Copyright (c) 2025 geoshp Contributors
// Licensed under the MIT License

//! # geoshp - GeoJSON to Shapefile conversion
//!
//! geoshp converts large, paginated GeoJSON feature collections into zipped
//! Shapefile archives and delivers them over HTTP or to an object store.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** a remote feature collection page by page into one GeoJSON file
//! - **Transforming** every feature on the way (nested `responses` lifted to `r.*`)
//! - **Converting** with an external program inside a per-job scratch workspace
//! - **Packaging** the outputs into a zip that streams while it is written
//! - **Delivering** the archive as the HTTP response, or uploading it after a
//!   `202 Accepted` that already names its final location
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`server`] - axum routes
//! - [`core`] - Pipeline (fetch, transform, convert, archive, delivery)
//! - [`adapters`] - External collaborators (feature source, converter, object store)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geoshp::config::load_config;
//! use geoshp::server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("geoshp.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     server::serve(&config, shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Asynchronous Delivery
//!
//! ```rust,no_run
//! use geoshp::config::load_config;
//! use geoshp::server::AppState;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("geoshp.toml")?;
//! let app = geoshp::server::router(AppState::from_config(&config)?, config.server.max_body_bytes);
//!
//! // POST /inversion/geojson2shp/parcels {"url": "https://..."}
//! //   -> 202 {"url": "http://<bucket>.s3.amazonaws.com/<prefix>/<job>/parcels.zip"}
//! # let _ = app;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error is
//! [`domain::GeoShpError`]. Only cleanup failures are non-fatal; they are
//! logged and never change a job's outcome.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
