//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
///
/// Functions in this crate return [`anyhow::Result`]; the kinds below are
/// recovered with `err.downcast_ref::<LwrlError>()`.
#[derive(Error, Debug)]
pub enum LwrlError {
    /// The action spec is malformed or not supported.
    #[error("Invalid action spec: {0}")]
    InvalidActionSpec(String),

    /// An action does not fit the action spec.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// The shape of an observation disagrees with the state spec.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape given by the state spec.
        expected: Vec<usize>,
        /// Shape of the observation.
        actual: Vec<usize>,
    },

    /// An update was requested with a zero-length batch.
    #[error("Empty batch")]
    EmptyBatch,

    /// Components of a batch have different lengths.
    #[error("Inconsistent batch: {0}")]
    InconsistentBatch(String),

    /// The checkpoint store holds no checkpoint.
    #[error("No checkpoint found in {0:?}")]
    NoCheckpointFound(PathBuf),

    /// No checkpoint store is configured.
    #[error("Checkpoint store is not configured")]
    NotConfigured,

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
