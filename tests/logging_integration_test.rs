//! Integration tests for logging functionality
//!
//! The global subscriber can be installed once per process, so everything that
//! touches `init_logging` lives in a single test.

use geoshp::config::LoggingConfig;
use geoshp::domain::{BaseName, GeoShpError, JobId, JobReport, JobState};
use geoshp::logging::init_logging;
use geoshp::{log_cleanup_failure, log_job_finished, log_large_archive};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "/var/log/geoshp");
}

#[test]
fn test_invalid_level_rejected_before_install() {
    let config = LoggingConfig {
        local_enabled: false,
        ..Default::default()
    };

    let err = init_logging("verbose", &config).err().unwrap();
    assert!(matches!(err, GeoShpError::Configuration(_)));
}

#[test]
fn test_job_events_written_as_json() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_dir.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    // Events below are emitted from this crate, not `geoshp`
    std::env::set_var("RUST_LOG", "debug");
    let guard = init_logging("debug", &config).unwrap();
    assert!(log_dir.is_dir());

    let job_id = JobId::generate();
    let mut report = JobReport::new(job_id.clone(), BaseName::new("parcels").unwrap());
    report.advance(JobState::Converting).unwrap();
    report.fail(&GeoShpError::Conversion("exit status 1".to_string()));

    log_job_finished!(&report);
    log_cleanup_failure!(job_id, "/tmp/scratch", "permission denied");
    log_large_archive!(job_id, 25_000_000u64, 20_971_520u64);

    // Flushes the non-blocking writer
    drop(guard);

    let contents = std::fs::read_to_string(log_dir.join("geoshp.log")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let failed = lines
        .iter()
        .find(|l| l["fields"]["message"] == "Job failed")
        .unwrap();
    assert_eq!(failed["level"], "ERROR");
    assert_eq!(failed["fields"]["job_id"], job_id.as_str());
    assert_eq!(failed["fields"]["state"], "failed");

    let large = lines
        .iter()
        .find(|l| l["fields"]["message"] == "Archive exceeds large-file threshold")
        .unwrap();
    assert_eq!(large["level"], "WARN");
    assert_eq!(large["fields"]["bytes"], 25_000_000u64);

    assert!(lines
        .iter()
        .any(|l| l["fields"]["message"] == "Cleanup failed"));
}
