//! Preprocessing steps.
use super::Preprocessor;
use crate::error::LwrlError;
use anyhow::Result;
use ndarray::{ArrayD, Axis, IxDyn};

/// Multiplies observations by a constant.
#[derive(Debug, Clone)]
pub struct Scale {
    factor: f32,
}

impl Scale {
    /// Constructs the step.
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl Preprocessor for Scale {
    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        Ok(obs * self.factor)
    }
}

/// Clips observation values to `[min_value, max_value]`.
#[derive(Debug, Clone)]
pub struct Clip {
    min_value: f32,
    max_value: f32,
}

impl Clip {
    /// Constructs the step.
    pub fn new(min_value: f32, max_value: f32) -> Self {
        Self {
            min_value,
            max_value,
        }
    }
}

impl Preprocessor for Clip {
    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let (lo, hi) = (self.min_value, self.max_value);
        Ok(obs.mapv_into(|x| x.max(lo).min(hi)))
    }
}

/// Standardizes each observation with its own mean and standard deviation.
#[derive(Debug, Clone)]
pub struct Standardize {
    epsilon: f32,
}

impl Standardize {
    /// Constructs the step.
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }
}

impl Preprocessor for Standardize {
    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let n = obs.len();
        if n == 0 {
            return Ok(obs);
        }
        let mean = obs.sum() / n as f32;
        let var = obs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n as f32;
        let std = var.sqrt() + self.epsilon;
        Ok(obs.mapv_into(|x| (x - mean) / std))
    }
}

/// Standardizes observations with running element-wise statistics.
///
/// Statistics are updated with Welford's algorithm on every
/// [`Preprocessor::process`] call and kept across episodes.
#[derive(Debug, Clone)]
pub struct RunningStandardize {
    epsilon: f32,
    clip: Option<f32>,
    count: u64,
    mean: Option<ArrayD<f32>>,
    m2: Option<ArrayD<f32>>,
}

impl RunningStandardize {
    /// Constructs the step.
    pub fn new(epsilon: f32, clip: Option<f32>) -> Self {
        Self {
            epsilon,
            clip,
            count: 0,
            mean: None,
            m2: None,
        }
    }

    /// Number of observations the statistics are computed from.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean, if at least one observation was processed.
    pub fn mean(&self) -> Option<&ArrayD<f32>> {
        self.mean.as_ref()
    }

    fn update(&mut self, obs: &ArrayD<f32>) -> Result<()> {
        let (mean, m2) = match (self.mean.as_mut(), self.m2.as_mut()) {
            (Some(mean), Some(m2)) => (mean, m2),
            _ => {
                self.count = 1;
                self.mean = Some(obs.clone());
                self.m2 = Some(ArrayD::zeros(obs.raw_dim()));
                return Ok(());
            }
        };
        if mean.shape() != obs.shape() {
            return Err(LwrlError::ShapeMismatch {
                expected: mean.shape().to_vec(),
                actual: obs.shape().to_vec(),
            }
            .into());
        }
        self.count += 1;
        let delta = obs - &*mean;
        *mean += &(&delta / self.count as f32);
        let delta2 = obs - &*mean;
        *m2 += &(&delta * &delta2);
        Ok(())
    }
}

impl Preprocessor for RunningStandardize {
    fn process(&mut self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.update(&obs)?;
        self.transform(obs)
    }

    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let (mean, m2) = match (&self.mean, &self.m2) {
            (Some(mean), Some(m2)) => (mean, m2),
            _ => return Ok(obs),
        };
        let count = self.count as f32;
        let std = m2.mapv(|v| (v / count + self.epsilon).sqrt());
        let out = (obs - mean) / &std;
        Ok(match self.clip {
            Some(c) => out.mapv_into(|x| x.max(-c).min(c)),
            None => out,
        })
    }
}

/// Reshapes observations to one dimension.
#[derive(Debug, Clone, Default)]
pub struct Flatten;

impl Preprocessor for Flatten {
    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let n = obs.len();
        let data = obs.iter().cloned().collect::<Vec<_>>();
        Ok(ArrayD::from_shape_vec(IxDyn(&[n]), data)?)
    }

    fn output_shape(&self, input: &[usize]) -> Vec<usize> {
        vec![input.iter().product()]
    }
}

/// Collapses the last axis, e.g., color channels, into one value.
///
/// Takes the mean of the axis, or the weighted sum when `weights` are given.
#[derive(Debug, Clone, Default)]
pub struct Grayscale {
    weights: Option<Vec<f32>>,
}

impl Grayscale {
    /// Constructs the step.
    pub fn new(weights: Option<Vec<f32>>) -> Self {
        Self { weights }
    }
}

impl Preprocessor for Grayscale {
    fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let ndim = obs.ndim();
        let channels = obs.shape().last().cloned().unwrap_or(0);
        if ndim == 0 || channels == 0 {
            return Err(LwrlError::InvalidConfig(format!(
                "grayscale needs a non-empty last axis, got shape {:?}",
                obs.shape()
            ))
            .into());
        }
        let out = match &self.weights {
            Some(w) => {
                if w.len() != channels {
                    return Err(LwrlError::ShapeMismatch {
                        expected: vec![w.len()],
                        actual: vec![channels],
                    }
                    .into());
                }
                obs.map_axis(Axis(ndim - 1), |lane| {
                    lane.iter().zip(w.iter()).map(|(x, w)| x * w).sum::<f32>()
                })
            }
            None => obs.map_axis(Axis(ndim - 1), |lane| lane.sum() / channels as f32),
        };
        Ok(out)
    }

    fn output_shape(&self, input: &[usize]) -> Vec<usize> {
        match input.split_last() {
            Some((_, rest)) => rest.to_vec(),
            None => vec![],
        }
    }
}
