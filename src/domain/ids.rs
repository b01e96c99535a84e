//! Domain identifier types with validation
//!
//! Newtype wrappers for the values that namespace a job's artifacts. Each type
//! validates its input once so downstream path derivation never has to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Job identity
///
/// An opaque token generated once per request. Every scratch path and the
/// remote delivery key of a job are derived from it, so two jobs never touch
/// the same path.
///
/// # Examples
///
/// ```
/// use geoshp::domain::ids::JobId;
///
/// let a = JobId::generate();
/// let b = JobId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh random job identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a JobId from an existing token
    ///
    /// Tokens end up in file names, so only ASCII alphanumerics and `-` are
    /// accepted.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!("Job ID contains invalid characters: {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Client-supplied archive base name
///
/// Used for the delivered file name (`<base>.zip`) and the remote key. Limited
/// to `[A-Za-z0-9._-]` without a leading dot so it can never escape a
/// directory.
///
/// # Examples
///
/// ```
/// use geoshp::domain::ids::BaseName;
///
/// assert_eq!(BaseName::default().as_str(), "output");
/// assert!(BaseName::new("parcels").is_ok());
/// assert!(BaseName::new("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseName(String);

impl BaseName {
    /// Base name used when the caller supplies none
    pub const DEFAULT: &'static str = "output";

    /// Creates a validated base name
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() {
            return Err("Base name cannot be empty".to_string());
        }
        if name.len() > 128 {
            return Err("Base name cannot exceed 128 characters".to_string());
        }
        if name.starts_with('.') {
            return Err(format!("Base name cannot start with '.': {name}"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(format!("Base name contains invalid characters: {name}"));
        }
        Ok(Self(name))
    }

    /// Resolves an optional caller value, falling back to [`BaseName::DEFAULT`]
    pub fn or_default(name: Option<&str>) -> Result<Self, String> {
        match name {
            Some(name) => Self::new(name),
            None => Ok(Self::default()),
        }
    }

    /// Returns the base name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the delivered archive
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.0)
    }
}

impl Default for BaseName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for BaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_job_id_generate_unique() {
        let ids: std::collections::HashSet<_> = (0..100).map(|_| JobId::generate()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_job_id_round_trips_through_display() {
        let id = JobId::generate();
        let parsed = JobId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_job_id_rejects_path_characters() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("abc/def").is_err());
        assert!(JobId::new("..").is_err());
    }

    #[test_case("parcels" ; "plain")]
    #[test_case("survey_2024-v2" ; "underscore and dash")]
    #[test_case("block.7" ; "inner dot")]
    fn test_base_name_valid(name: &str) {
        assert_eq!(BaseName::new(name).unwrap().as_str(), name);
    }

    #[test_case("" ; "empty")]
    #[test_case(".hidden" ; "leading dot")]
    #[test_case("a/b" ; "slash")]
    #[test_case("name with space" ; "space")]
    fn test_base_name_invalid(name: &str) {
        assert!(BaseName::new(name).is_err());
    }

    #[test]
    fn test_base_name_or_default() {
        assert_eq!(BaseName::or_default(None).unwrap().as_str(), "output");
        assert_eq!(
            BaseName::or_default(Some("parcels")).unwrap().as_str(),
            "parcels"
        );
        assert_eq!(
            BaseName::new("parcels").unwrap().archive_file_name(),
            "parcels.zip"
        );
    }
}
