//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for geoshp using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// geoshp - GeoJSON to Shapefile conversion service
#[derive(Parser, Debug)]
#[command(name = "geoshp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "geoshp.toml", env = "GEOSHP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "GEOSHP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP conversion service
    Serve(commands::serve::ServeArgs),

    /// Convert a local GeoJSON file or a remote collection once
    Convert(commands::convert::ConvertArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
