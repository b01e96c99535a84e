//! External conversion program
//!
//! The program itself is a black box: it receives an input GeoJSON path and
//! an output prefix inside a dedicated scratch directory, and is expected to
//! exit zero after populating that directory.

pub mod command;

pub use command::CommandConverter;

use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Converts a GeoJSON file into a set of files inside `workdir`
#[async_trait]
pub trait ShapefileConverter: Send + Sync {
    /// Run one conversion
    ///
    /// # Errors
    ///
    /// Returns [`GeoShpError::Conversion`](crate::domain::GeoShpError::Conversion)
    /// on launch failure, non-zero exit, or timeout.
    async fn convert(&self, input: &Path, workdir: &Path) -> Result<()>;
}
