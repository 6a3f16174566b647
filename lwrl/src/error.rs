use thiserror::Error;

/// Errors of experiments.
#[derive(Error, Debug)]
pub enum GymError {
    /// No environment is registered with the id.
    #[error("Unknown environment: {0}")]
    UnknownEnv(String),
}
