//! Error handling for the EEG workspace
//!
//! Decoding and windowing never fail; these errors cover configuration,
//! recording export and other operations that can be rejected up front.

use core::fmt;

/// Result type alias for EEG operations
pub type EegResult<T> = Result<T, EegError>;

/// Error type for all fallible EEG operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EegError {
    /// Sampling rate is zero, negative or not finite
    InvalidSampleRate {
        /// Provided sampling rate
        rate: f64,
    },

    /// Filter design parameters are unusable
    InvalidFilterConfig {
        /// Description of the problem
        reason: String,
    },

    /// A configuration value failed validation
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Description of the problem
        reason: String,
    },

    /// The recorder was reset while a recording session was open
    RecordingInvalidated {
        /// Raw sample index the session started at
        start_index: usize,
        /// Committed raw length when the session was finished
        available: usize,
    },

    /// Synthetic signal generation could not be set up
    SimulationError {
        /// Description of the problem
        reason: String,
    },

    /// Serialization/deserialization error
    SerializationError {
        /// Serialization error description
        reason: String,
    },
}

impl fmt::Display for EegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EegError::InvalidSampleRate { rate } => {
                write!(f, "Invalid sampling rate: {}Hz", rate)
            }
            EegError::InvalidFilterConfig { reason } => {
                write!(f, "Invalid filter configuration: {}", reason)
            }
            EegError::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration for {}: {}", field, reason)
            }
            EegError::RecordingInvalidated { start_index, available } => {
                write!(f, "Recording invalidated: started at sample {}, only {} samples available",
                       start_index, available)
            }
            EegError::SimulationError { reason } => {
                write!(f, "Simulation error: {}", reason)
            }
            EegError::SerializationError { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for EegError {}

impl From<serde_json::Error> for EegError {
    fn from(err: serde_json::Error) -> Self {
        EegError::SerializationError {
            reason: err.to_string(),
        }
    }
}

/// Validate a sampling rate, returning it unchanged when usable
pub fn validate_sample_rate(rate: f64) -> EegResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(EegError::InvalidSampleRate { rate })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($field:literal, $($arg:tt)+) => {
        $crate::error::EegError::InvalidConfig {
            field: $field,
            reason: format!($($arg)+),
        }
    };
}
