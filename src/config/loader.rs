//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Environment, GeoShpConfig, StorageBackend};
use super::secret::secret_string;
use crate::domain::errors::GeoShpError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into GeoShpConfig
/// 4. Applies environment variable overrides (GEOSHP_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed, a
/// referenced environment variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use geoshp::config::loader::load_config;
///
/// let config = load_config("geoshp.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<GeoShpConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GeoShpError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        GeoShpError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Loads configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn load_config_str(contents: &str) -> Result<GeoShpConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: GeoShpConfig = toml::from_str(&contents)
        .map_err(|e| GeoShpError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        GeoShpError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_regex();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(GeoShpError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env(name) {
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            GeoShpError::Configuration(format!("Invalid value for {name}: '{raw}'"))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using GEOSHP_* prefix
///
/// Environment variables follow the pattern: GEOSHP_<SECTION>_<KEY>,
/// e.g. GEOSHP_SERVER_PORT or GEOSHP_OBJECT_STORE_BUCKET.
fn apply_env_overrides(config: &mut GeoShpConfig) -> Result<()> {
    if let Some(val) = env("GEOSHP_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env("GEOSHP_ENVIRONMENT") {
        config.environment = match val.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            _ => {
                return Err(GeoShpError::Configuration(format!(
                    "Invalid GEOSHP_ENVIRONMENT '{val}'"
                )))
            }
        };
    }

    // Server
    if let Some(val) = env("GEOSHP_SERVER_HOST") {
        config.server.host = val;
    }
    if let Some(port) = env_parsed("GEOSHP_SERVER_PORT")? {
        config.server.port = port;
    }
    if let Some(limit) = env_parsed("GEOSHP_SERVER_MAX_BODY_BYTES")? {
        config.server.max_body_bytes = limit;
    }

    // Workspace and conversion profile
    if let Some(val) = env("GEOSHP_WORKSPACE_ROOT") {
        config.workspace.root = PathBuf::from(val);
    }
    if let Some(val) = env("GEOSHP_CONVERSION_PROGRAM") {
        config.conversion.program = val;
    }
    if let Some(timeout) = env_parsed("GEOSHP_CONVERSION_TIMEOUT_SECONDS")? {
        config.conversion.timeout_seconds = timeout;
    }

    // Source
    if let Some(size) = env_parsed("GEOSHP_SOURCE_PAGE_SIZE")? {
        config.source.page_size = size;
    }
    if let Some(timeout) = env_parsed("GEOSHP_SOURCE_TIMEOUT_SECONDS")? {
        config.source.timeout_seconds = timeout;
    }

    // Archive
    if let Some(threshold) = env_parsed("GEOSHP_ARCHIVE_LARGE_FILE_THRESHOLD_BYTES")? {
        config.archive.large_file_threshold_bytes = threshold;
    }

    // Object store
    if let Some(val) = env("GEOSHP_OBJECT_STORE_BACKEND") {
        config.object_store.backend = match val.to_lowercase().as_str() {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            _ => {
                return Err(GeoShpError::Configuration(format!(
                    "Invalid GEOSHP_OBJECT_STORE_BACKEND '{val}'"
                )))
            }
        };
    }
    if let Some(val) = env("GEOSHP_OBJECT_STORE_BUCKET") {
        config.object_store.bucket = val;
    }
    if let Some(val) = env("GEOSHP_OBJECT_STORE_PREFIX") {
        config.object_store.prefix = val;
    }
    if let Some(val) = env("GEOSHP_OBJECT_STORE_REGION") {
        config.object_store.region = val;
    }
    if let Some(val) = env("GEOSHP_OBJECT_STORE_ACCESS_KEY_ID") {
        config.object_store.access_key_id = Some(secret_string(val));
    }
    if let Some(val) = env("GEOSHP_OBJECT_STORE_SECRET_ACCESS_KEY") {
        config.object_store.secret_access_key = Some(secret_string(val));
    }
    if let Some(val) = env("GEOSHP_OBJECT_STORE_LOCAL_ROOT") {
        config.object_store.local_root = PathBuf::from(val);
    }

    // Jobs
    if let Some(deadline) = env_parsed("GEOSHP_JOBS_DEADLINE_SECONDS")? {
        config.jobs.deadline_seconds = deadline;
    }

    // Logging
    if let Some(enabled) = env_parsed("GEOSHP_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Some(val) = env("GEOSHP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("GEOSHP_LOADER_TEST_VAR", "test_value");
        let input = "bucket = \"${GEOSHP_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "bucket = \"test_value\"\n");
        std::env::remove_var("GEOSHP_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("GEOSHP_LOADER_MISSING_VAR");
        let input = "bucket = \"${GEOSHP_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("GEOSHP_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# bucket = \"${GEOSHP_LOADER_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
environment = "development"

[application]
log_level = "debug"

[conversion]
program = "ogr2ogr"
output_name = "parcels"

[object_store]
backend = "local"
local_root = "/tmp/geoshp-exports"

[logging]
local_enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.conversion.output_name, "parcels");
        assert_eq!(config.object_store.backend, StorageBackend::Local);
        assert_eq!(config.source.page_size, 5000);
    }

    #[test]
    fn test_load_config_invalid_fails_validation() {
        let toml_content = r#"
[object_store]
backend = "s3"
"#;
        let err = load_config_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }
}
