//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.
//! The execution profile (working directory root, conversion command) is an
//! explicit value handed to the orchestrators at construction time.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Object store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Amazon S3
    #[default]
    S3,
    /// Local directory, for development and tests
    Local,
}

/// Main configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoShpConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Scratch workspace settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// External conversion program
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Paginated feature source
    #[serde(default)]
    pub source: SourceConfig,

    /// Archive packaging
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Object store used for asynchronous delivery
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Job limits
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GeoShpConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate()?;
        self.workspace.validate()?;
        self.conversion.validate()?;
        self.source.validate()?;
        self.archive.validate()?;
        self.object_store.validate(&self.environment)?;
        self.jobs.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("server.host cannot be empty".to_string());
        }
        if self.max_body_bytes == 0 {
            return Err("server.max_body_bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Scratch workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory under which every per-job scratch path is created
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
}

impl WorkspaceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("workspace.root cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
        }
    }
}

/// External conversion program configuration
///
/// `args` are passed verbatim after substituting `{input}` (GeoJSON path),
/// `{output}` (output path prefix inside the workspace) and `{workdir}`
/// (the workspace directory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Program to execute
    #[serde(default = "default_program")]
    pub program: String,

    /// Argument template
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Fixed output base name inside the workspace
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Maximum run time of one invocation
    #[serde(default = "default_conversion_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl ConversionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("conversion.program cannot be empty".to_string());
        }
        if !self.args.iter().any(|a| a.contains("{input}")) {
            return Err("conversion.args must reference {input}".to_string());
        }
        if self.output_name.is_empty()
            || self.output_name.contains('/')
            || self.output_name.starts_with('.')
        {
            return Err(format!(
                "conversion.output_name '{}' must be a plain file name",
                self.output_name
            ));
        }
        if self.timeout_seconds == 0 {
            return Err("conversion.timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            output_name: default_output_name(),
            timeout_seconds: default_conversion_timeout_seconds(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per page
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Paginated feature source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Features requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Query parameter carrying the zero-based start offset
    #[serde(default = "default_start_param")]
    pub start_param: String,

    /// Query parameter carrying the page size
    #[serde(default = "default_count_param")]
    pub count_param: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=50_000).contains(&self.page_size) {
            return Err(format!(
                "source.page_size must be between 1 and 50000, got {}",
                self.page_size
            ));
        }
        if self.start_param.is_empty() || self.count_param.is_empty() {
            return Err("source.start_param and source.count_param cannot be empty".to_string());
        }
        if self.start_param == self.count_param {
            return Err("source.start_param and source.count_param must differ".to_string());
        }
        if self.retry.max_retries == 0 || self.retry.max_retries > 10 {
            return Err(format!(
                "source.retry.max_retries must be between 1 and 10, got {}",
                self.retry.max_retries
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err("source.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            start_param: default_start_param(),
            count_param: default_count_param(),
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Archive packaging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archives larger than this emit a warning
    #[serde(default = "default_large_file_threshold_bytes")]
    pub large_file_threshold_bytes: u64,

    /// Number of in-flight chunks between the packer and the consumer
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,
}

impl ArchiveConfig {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_capacity == 0 {
            return Err("archive.chunk_capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            large_file_threshold_bytes: default_large_file_threshold_bytes(),
            chunk_capacity: default_chunk_capacity(),
        }
    }
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Backend type
    #[serde(default)]
    pub backend: StorageBackend,

    /// S3 bucket name
    #[serde(default)]
    pub bucket: String,

    /// Key prefix prepended to every delivery key
    #[serde(default)]
    pub prefix: String,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID
    #[serde(default)]
    pub access_key_id: Option<SecretString>,

    /// Secret access key
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub secret_access_key: Option<SecretString>,

    /// Custom endpoint for S3-compatible stores
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Root directory for the local backend
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// URL under which the local root is served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl ObjectStoreConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        use secrecy::ExposeSecret;

        match self.backend {
            StorageBackend::S3 => {
                if self.bucket.is_empty() {
                    return Err("object_store.bucket cannot be empty for the s3 backend".to_string());
                }
                let present = |s: &Option<SecretString>| {
                    s.as_ref()
                        .map(|v| !v.expose_secret().is_empty())
                        .unwrap_or(false)
                };
                if !present(&self.access_key_id) || !present(&self.secret_access_key) {
                    return Err(
                        "object_store.access_key_id and object_store.secret_access_key are required for the s3 backend"
                            .to_string(),
                    );
                }
                if self.region.is_empty() {
                    return Err("object_store.region cannot be empty".to_string());
                }
            }
            StorageBackend::Local => {
                if *environment == Environment::Production {
                    return Err(
                        "The local object store backend cannot be used in production environments"
                            .to_string(),
                    );
                }
                if self.local_root.as_os_str().is_empty() {
                    return Err("object_store.local_root cannot be empty".to_string());
                }
            }
        }
        Ok(())
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: String::new(),
            prefix: String::new(),
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            local_root: default_local_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Job limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Deadline for one asynchronous job, from acknowledgement to cleanup
    #[serde(default = "default_deadline_seconds")]
    pub deadline_seconds: u64,
}

impl JobsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.deadline_seconds == 0 {
            return Err("jobs.deadline_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: default_deadline_seconds(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled = true".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_program() -> String {
    "ogr2ogr".to_string()
}

fn default_args() -> Vec<String> {
    ["-f", "ESRI Shapefile", "{output}.shp", "{input}"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_output_name() -> String {
    "shapefile".to_string()
}

fn default_conversion_timeout_seconds() -> u64 {
    600
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_page_size() -> usize {
    5000
}

fn default_start_param() -> String {
    "startIndex".to_string()
}

fn default_count_param() -> String {
    "count".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_large_file_threshold_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_chunk_capacity() -> usize {
    16
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_public_base_url() -> String {
    "http://localhost:3000/exports".to_string()
}

fn default_deadline_seconds() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "/var/log/geoshp".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretValue;
    use secrecy::Secret;

    fn local_config() -> GeoShpConfig {
        GeoShpConfig {
            object_store: ObjectStoreConfig {
                backend: StorageBackend::Local,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn secret(s: &str) -> Option<SecretString> {
        Some(Secret::new(SecretValue::from(s.to_string())))
    }

    #[test]
    fn test_defaults() {
        let config = GeoShpConfig::default();
        assert_eq!(config.source.page_size, 5000);
        assert_eq!(config.archive.large_file_threshold_bytes, 20 * 1024 * 1024);
        assert_eq!(config.conversion.program, "ogr2ogr");
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_local_backend_valid_in_development() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn test_local_backend_rejected_in_production() {
        let mut config = local_config();
        config.environment = Environment::Production;
        let err = config.validate().unwrap_err();
        assert!(err.contains("production"));
    }

    #[test]
    fn test_s3_backend_requires_credentials() {
        let mut config = GeoShpConfig::default();
        config.object_store.bucket = "bucket".to_string();
        assert!(config.validate().is_err());

        config.object_store.access_key_id = secret("AKIA");
        config.object_store.secret_access_key = secret("shh");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = local_config();
        config.source.page_size = 0;
        assert!(config.validate().is_err());
        config.source.page_size = 50_001;
        assert!(config.validate().is_err());
        config.source.page_size = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conversion_args_must_reference_input() {
        let mut config = local_config();
        config.conversion.args = vec!["{output}".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_name_must_be_plain() {
        let mut config = local_config();
        config.conversion.output_name = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = local_config();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let mut config = local_config();
        config.object_store.secret_access_key = secret("super-secret");
        let debug = format!("{:?}", config.object_store);
        assert!(!debug.contains("super-secret"));
    }
}
