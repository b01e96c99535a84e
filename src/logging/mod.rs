//! Logging and observability
//!
//! Structured logging on `tracing`: console output plus an optional JSON
//! rolling file. Job events carry `job_id` so one job's lines can be
//! correlated across the fetch, convert, archive and delivery stages.
//!
//! # Example
//!
//! ```no_run
//! use geoshp::logging::init_logging;
//! use geoshp::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Service started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the end of a job from its [`JobReport`](crate::domain::JobReport)
///
/// # Example
///
/// ```no_run
/// use geoshp::log_job_finished;
/// use geoshp::domain::{BaseName, JobId, JobReport};
///
/// let report = JobReport::new(JobId::generate(), BaseName::default());
/// log_job_finished!(&report);
/// ```
#[macro_export]
macro_rules! log_job_finished {
    ($report:expr) => {
        match &$report.error {
            None => tracing::info!(
                job_id = %$report.job_id,
                base_name = %$report.base_name,
                state = %$report.state,
                features = $report.features_fetched,
                pages = $report.pages_fetched,
                bytes = ?$report.archive_bytes,
                duration_ms = ?$report.duration_ms(),
                "Job finished"
            ),
            Some(error) => tracing::error!(
                job_id = %$report.job_id,
                base_name = %$report.base_name,
                state = %$report.state,
                error = %error,
                duration_ms = ?$report.duration_ms(),
                "Job failed"
            ),
        }
    };
}

/// Log a best-effort cleanup failure
///
/// # Example
///
/// ```no_run
/// use geoshp::log_cleanup_failure;
/// use geoshp::domain::GeoShpError;
///
/// let error = GeoShpError::Cleanup("permission denied".to_string());
/// log_cleanup_failure!("job-1", "/tmp/job-1", &error);
/// ```
#[macro_export]
macro_rules! log_cleanup_failure {
    ($job_id:expr, $path:expr, $error:expr) => {
        tracing::warn!(
            job_id = %$job_id,
            path = %$path,
            error = %$error,
            "Cleanup failed"
        );
    };
}

/// Log an archive that crossed the large-file threshold
///
/// # Example
///
/// ```no_run
/// use geoshp::log_large_archive;
///
/// log_large_archive!("job-1", 25_000_000u64, 20_971_520u64);
/// ```
#[macro_export]
macro_rules! log_large_archive {
    ($job_id:expr, $bytes:expr, $threshold:expr) => {
        tracing::warn!(
            job_id = %$job_id,
            bytes = $bytes,
            threshold = $threshold,
            "Archive exceeds large-file threshold"
        );
    };
}

/// Log a retry attempt
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
