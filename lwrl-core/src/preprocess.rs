//! Preprocessing of observations.
//!
//! A [`Pipeline`] is an ordered sequence of [`Preprocessor`]s. Each step
//! consumes the output of the previous one; an empty pipeline is the
//! identity. Steps are usually built by name from [`PreprocessorConfig`]:
//!
//! ```yaml
//! state_preprocess_pipeline:
//!   - type: grayscale
//!     args: {}
//!   - type: scale
//!     args:
//!       factor: 0.00392156862
//!   - type: flatten
//! ```
mod config;
mod pipeline;
mod steps;
use anyhow::Result;
pub use config::PreprocessorConfig;
use ndarray::ArrayD;
pub use pipeline::Pipeline;
pub use steps::{Clip, Flatten, Grayscale, RunningStandardize, Scale, Standardize};

/// A transform applied to observations.
///
/// Steps may carry state, e.g., running statistics. The state is owned by the
/// step and updated only in [`Preprocessor::process`].
pub trait Preprocessor {
    /// Transforms an observation at acting time, updating internal state if any.
    fn process(&mut self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.transform(obs)
    }

    /// Transforms an observation with the current state, leaving it unchanged.
    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>>;

    /// Called at the start of an episode.
    fn reset(&mut self) {}

    /// Shape of the output given the shape of the input.
    fn output_shape(&self, input: &[usize]) -> Vec<usize> {
        input.to_vec()
    }
}
