//! Asynchronous delivery ("control inversion")
//!
//! The caller gets the final object location before anything exists there.
//! The job then runs detached:
//!
//! fetch → convert → drain archive to a local file → upload → remove local file
//!
//! Every failure after the acknowledgment is logged only. The whole job runs
//! under a deadline; on expiry the in-flight step is dropped, which kills the
//! converter and aborts pending requests, and the failure cleanup runs.

use crate::adapters::source::FeatureSource;
use crate::adapters::storage::ObjectStore;
use crate::core::convert::ConversionOrchestrator;
use crate::core::fetch::fetch_to_file;
use crate::core::workspace::JobPaths;
use crate::domain::{
    BaseName, DeliveryTarget, GeoShpError, JobId, JobReport, JobState, Result,
};
use crate::log_job_finished;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Settings for asynchronous jobs
#[derive(Debug, Clone)]
pub struct InversionSettings {
    /// Scratch root for job files
    pub workspace_root: PathBuf,
    /// Features requested per page
    pub page_size: usize,
    /// Upper bound on a whole job
    pub deadline: Duration,
}

/// A submitted asynchronous job
pub struct InversionJob {
    /// Where the archive will appear
    pub target: DeliveryTarget,
    /// Resolves with the final report
    pub handle: JoinHandle<JobReport>,
}

/// Runs fetch, conversion and upload after acknowledging the caller
#[derive(Clone)]
pub struct InversionDelivery {
    source: Arc<dyn FeatureSource>,
    orchestrator: ConversionOrchestrator,
    store: Arc<dyn ObjectStore>,
    settings: InversionSettings,
}

impl InversionDelivery {
    /// Create an asynchronous delivery orchestrator
    pub fn new(
        source: Arc<dyn FeatureSource>,
        orchestrator: ConversionOrchestrator,
        store: Arc<dyn ObjectStore>,
        settings: InversionSettings,
    ) -> Self {
        Self {
            source,
            orchestrator,
            store,
            settings,
        }
    }

    /// Derive the delivery target for a new job and start it
    ///
    /// Returns as soon as the job is spawned; no network or filesystem work
    /// has happened yet.
    pub fn submit(&self, source_url: Url, base_name: BaseName) -> InversionJob {
        let job_id = JobId::generate();
        let key = DeliveryTarget::key_for(self.store.prefix(), &job_id, &base_name);
        let target = DeliveryTarget {
            url: self.store.public_url(&key),
            key,
        };

        tracing::info!(
            job_id = %job_id,
            source = %source_url,
            key = %target.key,
            "Inversion job accepted"
        );

        let this = self.clone();
        let key = target.key.clone();
        let handle = tokio::spawn(async move {
            this.run(job_id, base_name, source_url, key).await
        });

        InversionJob { target, handle }
    }

    async fn run(self, job_id: JobId, base_name: BaseName, source_url: Url, key: String) -> JobReport {
        let paths = JobPaths::new(&self.settings.workspace_root, job_id.clone());
        let mut report = JobReport::new(job_id, base_name);

        let outcome = tokio::time::timeout(
            self.settings.deadline,
            self.execute(&paths, &source_url, &key, &mut report),
        )
        .await
        .unwrap_or_else(|_| {
            Err(GeoShpError::Timeout(format!(
                "Job exceeded {}s deadline",
                self.settings.deadline.as_secs()
            )))
        });

        if let Err(e) = outcome {
            report.fail(&e);
            // Failures are logged inside the cleanup helpers
            let _ = paths.cleanup().await;
            let _ = paths.remove_local_archive(&report.base_name).await;
        }

        log_job_finished!(report);
        report
    }

    async fn execute(
        &self,
        paths: &JobPaths,
        source_url: &Url,
        key: &str,
        report: &mut JobReport,
    ) -> Result<()> {
        report.advance(JobState::Fetching)?;
        let stats = fetch_to_file(
            self.source.as_ref(),
            source_url,
            self.settings.page_size,
            &paths.input_json(),
        )
        .await?;
        report.features_fetched = stats.features;
        report.pages_fetched = stats.pages;

        report.advance(JobState::Converting)?;
        let conversion = self.orchestrator.convert(paths).await?;

        report.advance(JobState::Archiving)?;
        let local_archive = paths.local_archive(&report.base_name);
        conversion.archive.drain_to_file(&local_archive).await?;
        report.archive_bytes = Some(conversion.finished.wait().await?);

        report.advance(JobState::Uploading)?;
        self.store.put_file(&local_archive, key).await?;

        report.advance(JobState::CleaningUp)?;
        let _ = paths.remove_local_archive(&report.base_name).await;

        report.advance(JobState::Done)?;
        Ok(())
    }
}
