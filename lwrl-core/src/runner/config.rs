//! Configuration of [`Runner`](super::Runner).
use crate::error::LwrlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Runner`](super::Runner).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RunnerConfig {
    /// Training stops when the model's timestep reaches this value.
    pub max_timesteps: u64,

    /// Warmup period, for filling replay buffer, in environment steps.
    pub warmup_period: u64,

    /// Interval of updates in environment steps.
    pub update_interval: u64,

    /// The number of transitions per update.
    pub batch_size: usize,

    /// Capacity of the replay buffer.
    pub replay_capacity: usize,

    /// Interval of saving in updates. Only the final save is done when `0`.
    pub save_interval: u64,

    /// Interval of logging update records in updates. Never logged when `0`.
    pub log_interval: u64,

    /// The number of episodes run by [`Runner::test`](super::Runner::test).
    pub test_episodes: usize,

    /// Seed of the replay buffer.
    pub seed: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_timesteps: 10000,
            warmup_period: 1000,
            update_interval: 1,
            batch_size: 64,
            replay_capacity: 10000,
            save_interval: 0,
            log_interval: 100,
            test_episodes: 10,
            seed: 42,
        }
    }
}

impl RunnerConfig {
    /// Sets the number of environment steps.
    pub fn max_timesteps(mut self, v: u64) -> Self {
        self.max_timesteps = v;
        self
    }

    /// Sets warmup period in environment steps.
    pub fn warmup_period(mut self, v: u64) -> Self {
        self.warmup_period = v;
        self
    }

    /// Sets the interval of updates in environment steps.
    pub fn update_interval(mut self, v: u64) -> Self {
        self.update_interval = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the capacity of the replay buffer.
    pub fn replay_capacity(mut self, v: usize) -> Self {
        self.replay_capacity = v;
        self
    }

    /// Sets the interval of saving in updates.
    pub fn save_interval(mut self, v: u64) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the interval of logging in updates.
    pub fn log_interval(mut self, v: u64) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the number of test episodes.
    pub fn test_episodes(mut self, v: usize) -> Self {
        self.test_episodes = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the values.
    pub fn validate(&self) -> Result<()> {
        let err = |msg: &str| -> Result<()> {
            Err(LwrlError::InvalidConfig(format!("runner: {}", msg)).into())
        };
        if self.update_interval == 0 {
            return err("update_interval must be positive");
        }
        if self.batch_size == 0 {
            return err("batch_size must be positive");
        }
        if self.replay_capacity == 0 {
            return err("replay_capacity must be positive");
        }
        Ok(())
    }

    /// Constructs [`RunnerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunnerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
