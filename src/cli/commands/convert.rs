//! Convert command implementation
//!
//! Runs one job locally and writes the archive to a file. With a file
//! argument the file is converted as-is; with `--url` the collection is
//! paged in first.

use crate::adapters::converter::CommandConverter;
use crate::adapters::source::HttpFeatureSource;
use crate::config::{load_config, GeoShpConfig};
use crate::core::convert::ConversionOrchestrator;
use crate::core::delivery::DirectDelivery;
use crate::core::fetch::fetch_to_file;
use crate::core::workspace::JobPaths;
use crate::domain::{BaseName, GeoShpError, JobId, Result};
use bytes::Bytes;
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// GeoJSON file to convert
    #[arg(conflicts_with = "url", required_unless_present = "url")]
    pub input: Option<String>,

    /// Paginated feature collection to fetch and convert
    #[arg(long)]
    pub url: Option<String>,

    /// Archive file to write
    #[arg(short, long, default_value = "output.zip")]
    pub output: String,
}

impl ConvertArgs {
    /// Execute the convert command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let output = Path::new(&self.output);
        let result = match (&self.input, &self.url) {
            (Some(input), _) => self.convert_file(&config, Path::new(input), output).await,
            (None, Some(url)) => {
                let url = match Url::parse(url) {
                    Ok(url) => url,
                    Err(e) => {
                        eprintln!("❌ Invalid --url: {e}");
                        return Ok(2);
                    }
                };
                self.convert_url(&config, &url, output).await
            }
            (None, None) => {
                eprintln!("❌ Provide a GeoJSON file or --url");
                return Ok(2);
            }
        };

        match result {
            Ok(bytes) => {
                println!("✅ Wrote {} ({bytes} bytes)", self.output);
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Conversion failed");
                eprintln!("❌ Conversion failed: {e}");
                Ok(5)
            }
        }
    }

    async fn convert_file(&self, config: &GeoShpConfig, input: &Path, output: &Path) -> Result<u64> {
        let body = Bytes::from(tokio::fs::read(input).await?);
        let delivery = DirectDelivery::new(orchestrator(config), config.workspace.root.clone());

        let job = delivery.handle(body, BaseName::default()).await?;
        let written = job.archive.drain_to_file(output).await?;

        // Cleanup finishes before the process exits
        let report = job
            .report
            .await
            .map_err(|e| GeoShpError::Archive(format!("Conversion task failed: {e}")))?;
        match report.error {
            Some(error) => Err(GeoShpError::Archive(error)),
            None => Ok(written),
        }
    }

    async fn convert_url(&self, config: &GeoShpConfig, url: &Url, output: &Path) -> Result<u64> {
        let source = HttpFeatureSource::new(config.source.clone())?;
        let paths = JobPaths::new(&config.workspace.root, JobId::generate());

        let stats =
            match fetch_to_file(&source, url, config.source.page_size, &paths.input_json()).await {
                Ok(stats) => stats,
                Err(e) => {
                    let _ = paths.cleanup().await;
                    return Err(e);
                }
            };
        println!(
            "📥 Fetched {} features in {} pages",
            stats.features, stats.pages
        );

        let conversion = orchestrator(config).convert(&paths).await?;
        let written = conversion.archive.drain_to_file(output).await?;
        conversion.finished.wait().await?;
        Ok(written)
    }
}

fn orchestrator(config: &GeoShpConfig) -> ConversionOrchestrator {
    ConversionOrchestrator::new(
        Arc::new(CommandConverter::new(config.conversion.clone())),
        config.archive.clone(),
    )
}
