//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the geoshp configuration file.

use crate::config::{load_config, StorageBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading validates as well
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Listen: {}:{}",
            config.server.host, config.server.port
        );
        println!("  Workspace Root: {}", config.workspace.root.display());
        println!(
            "  Converter: {} {}",
            config.conversion.program,
            config.conversion.args.join(" ")
        );
        println!("  Page Size: {}", config.source.page_size);
        println!(
            "  Large Archive Threshold: {} bytes",
            config.archive.large_file_threshold_bytes
        );

        match config.object_store.backend {
            StorageBackend::S3 => {
                println!("  Object Store: S3");
                println!("  Bucket: {}", config.object_store.bucket);
                println!("  Region: {}", config.object_store.region);
                if let Some(endpoint) = &config.object_store.endpoint {
                    println!("  Endpoint: {endpoint}");
                }
            }
            StorageBackend::Local => {
                println!("  Object Store: local");
                println!("  Root: {}", config.object_store.local_root.display());
                println!("  Public URL: {}", config.object_store.public_base_url);
            }
        }
        println!("  Key Prefix: {}", config.object_store.prefix);
        println!("  Job Deadline: {}s", config.jobs.deadline_seconds);
        println!();
        Ok(0)
    }
}
