//! Serve command implementation
//!
//! Logging for this command is initialized from the loaded configuration,
//! including the optional rolling file.

use crate::config::load_config;
use crate::logging::init_logging;
use crate::server;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the bind port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the bind host
    #[arg(long)]
    pub host: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        log_level: Option<&str>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }

        let level = log_level
            .unwrap_or(config.application.log_level.as_str())
            .to_string();
        let _guard = match init_logging(&level, &config.logging) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Failed to initialize logging: {e}");
                return Ok(5);
            }
        };

        tracing::info!(
            host = %config.server.host,
            port = config.server.port,
            environment = ?config.environment,
            workspace = %config.workspace.root.display(),
            "Starting conversion service"
        );

        server::serve(&config, shutdown_signal).await?;

        tracing::info!("Conversion service stopped");
        Ok(0)
    }
}
