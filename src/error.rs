//! Error types for the crd-anova library.
//!
//! This module provides error handling using the `thiserror` crate, with
//! variants for insufficient data, degenerate variance, violated
//! preconditions of the post-hoc test, and invalid design parameters.

use thiserror::Error;

/// The main error type for the crd-anova library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Analysis Errors ============
    /// Too few groups, an empty group, or no replication to estimate error.
    #[error("insufficient data: {message}")]
    InsufficientData {
        /// Description of what is missing.
        message: String,
    },

    /// The within-group mean square is zero while treatments still differ,
    /// so the F-ratio is undefined.
    #[error("degenerate variance: within-group mean square is zero (between-group mean square {ms_between})")]
    DegenerateVariance {
        /// The between-group mean square that could not be tested.
        ms_between: f64,
    },

    /// A precondition of the post-hoc test was violated.
    #[error("invalid precondition: {message}")]
    InvalidPrecondition {
        /// Description of the violated precondition.
        message: String,
    },

    // ============ Parameter Validation Errors ============
    /// Invalid design or configuration parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// An observation carries a label outside the declared treatment set.
    #[error("observation label {label:?} is not a declared treatment")]
    UnknownLabel {
        /// The offending label.
        label: String,
    },

    /// No catalogue design matches the requested identifier.
    #[error("unknown design identifier: {0}")]
    UnknownDesign(String),
}

/// A specialized `Result` type for crd-anova operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InsufficientData` error.
    #[must_use]
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// Create a new `InvalidPrecondition` error.
    #[must_use]
    pub fn invalid_precondition(message: impl Into<String>) -> Self {
        Self::InvalidPrecondition {
            message: message.into(),
        }
    }

    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}
