//! Subprocess implementation of [`ShapefileConverter`]

use super::ShapefileConverter;
use crate::config::ConversionConfig;
use crate::domain::{GeoShpError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs the configured program through `tokio::process`
///
/// The child is killed if the invocation future is dropped, so a job deadline
/// also tears down a running conversion.
///
/// # Example
///
/// ```no_run
/// use geoshp::adapters::converter::{CommandConverter, ShapefileConverter};
/// use geoshp::config::ConversionConfig;
/// use std::path::Path;
///
/// # async fn example() -> geoshp::domain::Result<()> {
/// let converter = CommandConverter::new(ConversionConfig::default());
/// converter.convert(Path::new("/tmp/job.json"), Path::new("/tmp/job")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CommandConverter {
    config: ConversionConfig,
}

impl CommandConverter {
    /// Create a converter for the given program profile
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Argument list with `{input}`, `{output}` and `{workdir}` filled in
    pub fn render_args(&self, input: &Path, workdir: &Path) -> Vec<String> {
        let output = workdir.join(&self.config.output_name);
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let workdir = workdir.to_string_lossy();

        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{workdir}", &workdir)
            })
            .collect()
    }
}

#[async_trait]
impl ShapefileConverter for CommandConverter {
    async fn convert(&self, input: &Path, workdir: &Path) -> Result<()> {
        let args = self.render_args(input, workdir);

        tracing::debug!(
            program = %self.config.program,
            args = ?args,
            workdir = %workdir.display(),
            "Launching conversion program"
        );

        let child = Command::new(&self.config.program)
            .args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                GeoShpError::Conversion(format!(
                    "Failed to launch '{}': {e}",
                    self.config.program
                ))
            })?;

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                GeoShpError::Conversion(format!(
                    "'{}' did not finish within {}s",
                    self.config.program, self.config.timeout_seconds
                ))
            })?
            .map_err(|e| GeoShpError::Conversion(format!("Failed to collect output: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(
            status = %output.status,
            stdout = %stdout.trim(),
            stderr = %stderr.trim(),
            "Conversion program exited"
        );

        if !output.status.success() {
            return Err(GeoShpError::Conversion(format!(
                "'{}' exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn shell(script: &str) -> ConversionConfig {
        ConversionConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                script.to_string(),
                "convert".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            output_name: "shapefile".to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_render_args() {
        let converter = CommandConverter::new(ConversionConfig::default());
        let args = converter.render_args(Path::new("/tmp/j.json"), Path::new("/tmp/j"));
        assert_eq!(
            args,
            vec!["-f", "ESRI Shapefile", "/tmp/j/shapefile.shp", "/tmp/j.json"]
        );
    }

    #[tokio::test]
    async fn test_successful_run_populates_workdir() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(&input, "{}").unwrap();
        let workdir = dir.path().join("work");
        std::fs::create_dir(&workdir).unwrap();

        let converter = CommandConverter::new(shell(r#"cp "$1" "$2.shp""#));
        converter.convert(&input, &workdir).await.unwrap();

        assert!(workdir.join("shapefile.shp").exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let converter = CommandConverter::new(shell("echo broken >&2; exit 3"));
        let err = converter
            .convert(&dir.path().join("in.json"), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, GeoShpError::Conversion(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_launch_failure_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let mut config = shell("true");
        config.program = "/nonexistent/geoshp-converter".to_string();
        let err = CommandConverter::new(config)
            .convert(&dir.path().join("in.json"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoShpError::Conversion(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let mut config = shell("sleep 5");
        config.timeout_seconds = 1;
        let err = CommandConverter::new(config)
            .convert(&dir.path().join("in.json"), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }
}
