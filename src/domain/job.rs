//! Job lifecycle model
//!
//! A job walks `Created → Fetching? → Converting → Archiving →
//! (Streaming | Uploading) → CleaningUp → Done`. `Failed` is reachable from
//! every non-terminal state.

use super::ids::{BaseName, JobId};
use super::{GeoShpError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a conversion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job identity assigned, nothing on disk yet
    Created,
    /// Pulling pages from the remote source
    Fetching,
    /// External conversion program running
    Converting,
    /// Packaging conversion outputs
    Archiving,
    /// Archive bytes flowing to an HTTP client
    Streaming,
    /// Archive file being uploaded to the object store
    Uploading,
    /// Removing scratch artifacts
    CleaningUp,
    /// Finished successfully
    Done,
    /// Finished with a fatal error
    Failed,
}

impl JobState {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Created, Fetching)
                | (Created, Converting)
                | (Fetching, Converting)
                | (Converting, Archiving)
                | (Archiving, Streaming)
                | (Archiving, Uploading)
                | (Streaming, CleaningUp)
                | (Uploading, CleaningUp)
                | (CleaningUp, Done)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Created => "created",
            JobState::Fetching => "fetching",
            JobState::Converting => "converting",
            JobState::Archiving => "archiving",
            JobState::Streaming => "streaming",
            JobState::Uploading => "uploading",
            JobState::CleaningUp => "cleaning_up",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Progress record of a single job
///
/// Owned by the orchestrator driving the job and logged when the job ends.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Job identity
    pub job_id: JobId,

    /// Archive base name
    pub base_name: BaseName,

    /// Current lifecycle state
    pub state: JobState,

    /// Features written by the fetch stage
    pub features_fetched: usize,

    /// Pages requested by the fetch stage
    pub pages_fetched: usize,

    /// Total archive bytes, once finalized
    pub archive_bytes: Option<u64>,

    /// Error message if the job failed
    pub error: Option<String>,

    /// When the job was created
    pub started_at: DateTime<Utc>,

    /// When the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobReport {
    /// Creates a report in the `Created` state
    pub fn new(job_id: JobId, base_name: BaseName) -> Self {
        Self {
            job_id,
            base_name,
            state: JobState::Created,
            features_fetched: 0,
            pages_fetched: 0,
            archive_bytes: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Moves the job to `next`
    ///
    /// # Errors
    ///
    /// Returns a validation error for an illegal transition.
    pub fn advance(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(GeoShpError::Validation(format!(
                "Illegal job transition {} -> {next}",
                self.state
            )));
        }
        tracing::debug!(
            job_id = %self.job_id,
            from = %self.state,
            to = %next,
            "Job state transition"
        );
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Marks the job failed, recording the error
    ///
    /// Non-fatal errors (cleanup) never change the outcome.
    pub fn fail(&mut self, error: &GeoShpError) {
        if self.state.is_terminal() || !error.is_fatal() {
            return;
        }
        self.error = Some(error.to_string());
        self.state = JobState::Failed;
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in milliseconds, if finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> JobReport {
        JobReport::new(JobId::generate(), BaseName::default())
    }

    #[test]
    fn test_async_happy_path() {
        let mut r = report();
        for next in [
            JobState::Fetching,
            JobState::Converting,
            JobState::Archiving,
            JobState::Uploading,
            JobState::CleaningUp,
            JobState::Done,
        ] {
            r.advance(next).unwrap();
        }
        assert_eq!(r.state, JobState::Done);
        assert!(r.finished_at.is_some());
        assert!(r.duration_ms().is_some());
    }

    #[test]
    fn test_sync_path_skips_fetching() {
        let mut r = report();
        r.advance(JobState::Converting).unwrap();
        r.advance(JobState::Archiving).unwrap();
        r.advance(JobState::Streaming).unwrap();
        r.advance(JobState::CleaningUp).unwrap();
        r.advance(JobState::Done).unwrap();
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut r = report();
        assert!(r.advance(JobState::Uploading).is_err());
        assert_eq!(r.state, JobState::Created);
    }

    #[test]
    fn test_failed_reachable_from_every_non_terminal_state() {
        use JobState::*;
        for state in [
            Created, Fetching, Converting, Archiving, Streaming, Uploading, CleaningUp,
        ] {
            assert!(state.can_transition_to(Failed), "{state} -> failed");
        }
        assert!(!Done.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn test_fail_records_error_once() {
        let mut r = report();
        r.fail(&GeoShpError::Conversion("exit 1".to_string()));
        assert_eq!(r.state, JobState::Failed);
        assert!(r.error.as_deref().unwrap().contains("exit 1"));

        r.fail(&GeoShpError::Upload("late".to_string()));
        assert!(!r.error.as_deref().unwrap().contains("late"));
    }

    #[test]
    fn test_cleanup_error_does_not_fail_job() {
        let mut r = report();
        r.advance(JobState::Converting).unwrap();
        r.fail(&GeoShpError::Cleanup("permission denied".to_string()));

        assert_eq!(r.state, JobState::Converting);
        assert!(r.error.is_none());
        assert!(r.finished_at.is_none());
    }
}
