//! Configuration management.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `GEOSHP_<SECTION>_<KEY>` overrides
//! - Default values for every optional setting
//! - Validation on load
//!
//! The loaded [`GeoShpConfig`] is the execution profile: it is built once at
//! startup and passed by value into the orchestrators, never read from
//! global state.
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//!
//! [workspace]
//! root = "/var/tmp/geoshp"
//!
//! [conversion]
//! program = "ogr2ogr"
//! args = ["-f", "ESRI Shapefile", "{output}.shp", "{input}"]
//!
//! [object_store]
//! backend = "s3"
//! bucket = "geoshp-exports"
//! prefix = "exports"
//! access_key_id = "${AWS_ACCESS_KEY_ID}"
//! secret_access_key = "${AWS_SECRET_ACCESS_KEY}"
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use geoshp::config::load_config;
//!
//! # fn example() {
//! match load_config("geoshp.toml") {
//!     Ok(config) => println!("Configuration valid"),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_str};
pub use schema::{
    ApplicationConfig, ArchiveConfig, ConversionConfig, Environment, GeoShpConfig, JobsConfig,
    LoggingConfig, ObjectStoreConfig, RetryConfig, ServerConfig, SourceConfig, StorageBackend,
    WorkspaceConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
