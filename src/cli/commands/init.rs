//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "geoshp.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing geoshp configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Make sure the conversion program (ogr2ogr) is on PATH");
                println!("  3. For S3 delivery, set backend = \"s3\" and export");
                println!("     AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY");
                println!("  4. Validate configuration: geoshp validate-config");
                println!("  5. Start the service: geoshp serve");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# geoshp Configuration File
# GeoJSON to Shapefile conversion service

environment = "development"

[application]
log_level = "info"

[server]
host = "0.0.0.0"
port = 3000

[workspace]
root = "/tmp"

[conversion]
program = "ogr2ogr"
args = ["-f", "ESRI Shapefile", "{output}.shp", "{input}"]

[object_store]
backend = "local"
local_root = "./exports"
public_base_url = "http://localhost:3000/exports"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# geoshp Configuration File
# GeoJSON to Shapefile conversion service
#
# Values of the form ${VAR} are read from the environment.
# Any key can be overridden with GEOSHP_<SECTION>_<KEY>, e.g. GEOSHP_SERVER_PORT.

# development | staging | production
environment = "development"

[application]
# trace | debug | info | warn | error
log_level = "info"

[server]
host = "0.0.0.0"
port = 3000
# Largest accepted GeoJSON request body
max_body_bytes = 268435456

[workspace]
# Every job writes <root>/<id>.json, <root>/<id>/ and <root>/<id>_<name>.zip
root = "/tmp"

[conversion]
program = "ogr2ogr"
# {input}: GeoJSON file, {output}: <workspace>/<output_name>, {workdir}: workspace
args = ["-f", "ESRI Shapefile", "{output}.shp", "{input}"]
output_name = "shapefile"
timeout_seconds = 600

[source]
# Features requested per page (1-50000)
page_size = 5000
start_param = "startIndex"
count_param = "count"
timeout_seconds = 60

[source.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[archive]
# Archives above this size are logged as a warning
large_file_threshold_bytes = 20971520
chunk_capacity = 16

[object_store]
# s3 | local
backend = "local"
prefix = "exports"
local_root = "./exports"
public_base_url = "http://localhost:3000/exports"

# S3 delivery:
# backend = "s3"
# bucket = "geoshp-exports"
# region = "us-east-1"
# access_key_id = "${AWS_ACCESS_KEY_ID}"
# secret_access_key = "${AWS_SECRET_ACCESS_KEY}"
# endpoint = "http://localhost:9000"

[jobs]
# Upper bound on one asynchronous job
deadline_seconds = 3600

[logging]
local_enabled = true
local_path = "/var/log/geoshp"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_str, StorageBackend};

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "geoshp.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "geoshp.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_load() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = load_config_str(&content).unwrap();
            assert_eq!(config.object_store.backend, StorageBackend::Local);
            assert_eq!(config.conversion.program, "ogr2ogr");
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("geoshp.toml");
        std::fs::write(&path, "# mine").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }
}
