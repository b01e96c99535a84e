//! Delivery target for asynchronous jobs
//!
//! The target is announced to the caller before the object exists, so it must
//! be derivable from the job identity and base name alone.

use super::ids::{BaseName, JobId};
use serde::{Deserialize, Serialize};

/// Remote location an asynchronous job will eventually upload to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    /// Object key inside the bucket
    pub key: String,

    /// Public URL of the object once it exists
    pub url: String,
}

impl DeliveryTarget {
    /// Derives the object key `<prefix>/<job_id>/<base>.zip`
    ///
    /// Leading and trailing slashes on `prefix` are ignored; an empty prefix
    /// yields `<job_id>/<base>.zip`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoshp::domain::{BaseName, DeliveryTarget, JobId};
    ///
    /// let job = JobId::new("abc").unwrap();
    /// let base = BaseName::new("parcels").unwrap();
    /// assert_eq!(DeliveryTarget::key_for("/exports/", &job, &base), "exports/abc/parcels.zip");
    /// ```
    pub fn key_for(prefix: &str, job_id: &JobId, base_name: &BaseName) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{job_id}/{}", base_name.archive_file_name())
        } else {
            format!("{prefix}/{job_id}/{}", base_name.archive_file_name())
        }
    }
}
