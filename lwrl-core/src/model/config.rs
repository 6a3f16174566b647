//! Configuration of [`Model`](super::Model).
use crate::{
    checkpoint::SaverConfig, opt::OptimizerConfig, preprocess::PreprocessorConfig,
    schedule::ScheduleConfig,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_discount_factor() -> f64 {
    0.99
}

fn default_seed() -> u64 {
    42
}

/// Configuration of [`Model`](super::Model).
///
/// ```yaml
/// exploration_schedule:
///   type: linear
///   args:
///     initial_value: 1.0
///     final_value: 0.05
///     schedule_steps: 10000
/// optimizer:
///   type: adam
///   args:
///     lr: 0.001
/// saver_spec:
///   save_dir: ./model/dqn_cartpole
///   max_to_keep: 5
/// discount_factor: 0.99
/// state_preprocess_pipeline:
///   - type: flatten
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ModelConfig {
    /// Exploration is disabled when `None`.
    #[serde(default)]
    pub exploration_schedule: Option<ScheduleConfig>,

    /// Adam with learning rate 0.00025 when `None`.
    #[serde(default)]
    pub optimizer: Option<OptimizerConfig>,

    /// Saving and restoring are disabled when `None`.
    #[serde(default)]
    pub saver_spec: Option<SaverConfig>,

    /// Discount factor of future rewards, in `(0, 1]`.
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,

    /// Preprocessing steps applied to observations, in order.
    #[serde(default)]
    pub state_preprocess_pipeline: Vec<PreprocessorConfig>,

    /// Seed of the random number generator used for exploration.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            exploration_schedule: None,
            optimizer: None,
            saver_spec: None,
            discount_factor: default_discount_factor(),
            state_preprocess_pipeline: vec![],
            seed: default_seed(),
        }
    }
}

impl ModelConfig {
    /// Sets the exploration schedule.
    pub fn exploration_schedule(mut self, v: ScheduleConfig) -> Self {
        self.exploration_schedule = Some(v);
        self
    }

    /// Sets the optimizer.
    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = Some(v);
        self
    }

    /// Sets the checkpoint store.
    pub fn saver_spec(mut self, v: SaverConfig) -> Self {
        self.saver_spec = Some(v);
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Appends a preprocessing step.
    pub fn preprocess(mut self, v: PreprocessorConfig) -> Self {
        self.state_preprocess_pipeline.push(v);
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`ModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ModelConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_defaults() -> Result<()> {
        let config: ModelConfig = serde_yaml::from_str("{}")?;
        assert_eq!(config, ModelConfig::default());
        assert_eq!(config.discount_factor, 0.99);
        assert!(config.saver_spec.is_none());
        assert!(config.state_preprocess_pipeline.is_empty());
        Ok(())
    }

    #[test]
    fn test_serde_model_config() -> Result<()> {
        let config = ModelConfig::default()
            .exploration_schedule(ScheduleConfig::linear(1.0, 0.1, 1000))
            .optimizer(OptimizerConfig::Sgd { lr: 0.01 })
            .saver_spec(SaverConfig::new("model").max_to_keep(2))
            .discount_factor(0.9)
            .preprocess(PreprocessorConfig::Scale { factor: 0.5 })
            .preprocess(PreprocessorConfig::Flatten)
            .seed(7);

        let dir = TempDir::new("model_config")?;
        let path = dir.path().join("model_config.yaml");
        config.save(&path)?;
        let config_ = ModelConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
