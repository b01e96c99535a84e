//! Result type alias
//!
//! Convenience alias using [`GeoShpError`] as the error type.

use super::errors::GeoShpError;

/// Result type alias for pipeline operations
///
/// # Examples
///
/// ```
/// use geoshp::domain::result::Result;
/// use geoshp::domain::errors::GeoShpError;
///
/// fn failing_function() -> Result<()> {
///     Err(GeoShpError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, GeoShpError>;
