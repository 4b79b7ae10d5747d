//! Error types for kbeval.
//!
//! The error taxonomy follows the scoring pipeline's propagation policy:
//!
//! - **Integrity** errors (metatype mismatch between aligned items, more than
//!   two role-filler matches in a relation comparison) are fatal for the
//!   affected document or query and carry the ids needed to reproduce the
//!   inputs that triggered them.
//! - **Config** errors (unknown modality or language in a threshold lookup)
//!   are fatal for the run.
//! - Missing-data conditions (absent relevant-document counts, empty
//!   denominators) are *not* errors: scorers resolve them to a documented
//!   default of 0 and log a warning instead.

use thiserror::Error;

/// Result type for kbeval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for kbeval operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Data-integrity violation. Always fatal for the affected unit.
    #[error("Data integrity violation: {0}")]
    Integrity(String),

    /// Configuration error (threshold table, weighting mode).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input provided by a caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two spans of different modalities were compared.
    #[error("Modality mismatch: {left} vs {right}")]
    ModalityMismatch {
        /// Modality of the left-hand span.
        left: crate::span::Modality,
        /// Modality of the right-hand span.
        right: crate::span::Modality,
    },
}

impl Error {
    /// Create a data-integrity error.
    pub fn integrity(msg: impl Into<String>) -> Self {
        Error::Integrity(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
