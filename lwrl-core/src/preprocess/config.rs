//! Named preprocessing steps.
use super::{Clip, Flatten, Grayscale, Preprocessor, RunningStandardize, Scale, Standardize};
use crate::error::LwrlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

fn default_epsilon() -> f32 {
    1e-8
}

/// Configuration of a preprocessing step, written as `{type: name, args: {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum PreprocessorConfig {
    /// See [`Scale`].
    Scale {
        /// Multiplier.
        factor: f32,
    },

    /// See [`Clip`].
    Clip {
        /// Lower bound.
        min_value: f32,
        /// Upper bound.
        max_value: f32,
    },

    /// See [`Standardize`].
    Standardize {
        /// Added to the standard deviation.
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },

    /// See [`RunningStandardize`].
    RunningStandardize {
        /// Added to the variance.
        #[serde(default = "default_epsilon")]
        epsilon: f32,
        /// Standardized values are clipped to `[-clip, clip]`.
        #[serde(default)]
        clip: Option<f32>,
    },

    /// See [`Flatten`].
    Flatten,

    /// See [`Grayscale`].
    Grayscale {
        /// Weights of the channels. The mean is taken when not given.
        #[serde(default)]
        weights: Option<Vec<f32>>,
    },
}

impl PreprocessorConfig {
    /// Builds the step.
    pub fn build(&self) -> Result<Box<dyn Preprocessor>> {
        let step: Box<dyn Preprocessor> = match self {
            Self::Scale { factor } => Box::new(Scale::new(*factor)),
            Self::Clip {
                min_value,
                max_value,
            } => {
                if min_value > max_value {
                    return Err(LwrlError::InvalidConfig(format!(
                        "clip: min_value {} is larger than max_value {}",
                        min_value, max_value
                    ))
                    .into());
                }
                Box::new(Clip::new(*min_value, *max_value))
            }
            Self::Standardize { epsilon } => Box::new(Standardize::new(*epsilon)),
            Self::RunningStandardize { epsilon, clip } => {
                Box::new(RunningStandardize::new(*epsilon, *clip))
            }
            Self::Flatten => Box::new(Flatten),
            Self::Grayscale { weights } => Box::new(Grayscale::new(weights.clone())),
        };
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::Pipeline;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_build_pipeline_from_yaml() -> Result<()> {
        let yaml = "\
- type: grayscale
  args: {}
- type: scale
  args:
    factor: 0.5
- type: clip
  args:
    min_value: 0.0
    max_value: 2.0
- type: flatten
";
        let configs: Vec<PreprocessorConfig> = serde_yaml::from_str(yaml)?;
        assert_eq!(configs.len(), 4);
        assert_eq!(configs[0], PreprocessorConfig::Grayscale { weights: None });
        assert_eq!(configs[3], PreprocessorConfig::Flatten);

        let mut pipeline = Pipeline::build(&configs)?;
        assert_eq!(pipeline.output_shape(&[2, 2, 3]), vec![4]);

        let obs = ArrayD::from_shape_vec(IxDyn(&[2, 2, 3]), (0..12).map(|x| x as f32).collect())?;
        let out = pipeline.process(obs)?;
        assert_eq!(out.iter().cloned().collect::<Vec<_>>(), vec![0.5, 2.0, 2.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_invalid_clip() {
        let config = PreprocessorConfig::Clip {
            min_value: 1.0,
            max_value: 0.0,
        };
        assert!(config.build().is_err());
    }
}
