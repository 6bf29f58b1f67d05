//! Error types for cloudsift

use thiserror::Error;

/// Main error type for cloudsift operations
///
/// Every variant carries the offending parameter so a host application can
/// build its own message. Empty inputs are not errors: the algorithms return
/// empty outputs for them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        parameter: &'static str,
        reason: String,
    },

    #[error("index {index} out of bounds for point cloud of {len} points")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl Error {
    /// Shorthand for building an [`Error::InvalidArgument`]
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type alias for cloudsift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reject non-finite or non-positive values
pub fn ensure_positive(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(parameter, format!("must be a positive finite number, got {value}")))
    }
}

/// Reject non-finite or negative values
pub fn ensure_non_negative(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(parameter, format!("must be a non-negative finite number, got {value}")))
    }
}
