//! Persistence of trainable parameters and progress counters.
//!
//! Each checkpoint lives in its own directory named after the step it was
//! saved at:
//!
//! ```text
//! save_dir/
//!   1000/
//!     params.safetensors
//!     counters.yaml
//!   2000/
//!     ...
//! ```
//!
//! The latest checkpoint is the one with the largest step, regardless of
//! file modification times.
mod config;
use crate::error::LwrlError;
use anyhow::Result;
use candle_nn::VarMap;
pub use config::SaverConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

const PARAMS_FILE: &str = "params.safetensors";
const COUNTERS_FILE: &str = "counters.yaml";

/// Progress counters of a model.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Counters {
    /// Number of observed environment steps.
    pub timestep: u64,

    /// Number of completed updates.
    pub num_updates: u64,
}

/// Maps a step to a persisted snapshot of parameters and counters.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    save_dir: PathBuf,
    max_to_keep: Option<usize>,
}

impl CheckpointStore {
    /// Constructs a store. The directory is created on the first save.
    pub fn build(config: &SaverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            save_dir: PathBuf::from(&config.save_dir),
            max_to_keep: config.max_to_keep,
        })
    }

    /// Root directory of the checkpoints.
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Directory of the checkpoint at `step`.
    pub fn step_dir(&self, step: u64) -> PathBuf {
        self.save_dir.join(step.to_string())
    }

    /// Saves parameters and counters at `step`, overwriting an existing
    /// checkpoint at the same step.
    pub fn save(&self, step: u64, params: &VarMap, counters: &Counters) -> Result<PathBuf> {
        let dir = self.step_dir(step);
        fs::create_dir_all(&dir)?;

        // The counters file marks a complete checkpoint, so it goes last.
        let counters_path = dir.join(COUNTERS_FILE);
        if counters_path.exists() {
            fs::remove_file(&counters_path)?;
        }
        params.save(dir.join(PARAMS_FILE))?;
        let mut file = File::create(&counters_path)?;
        file.write_all(serde_yaml::to_string(counters)?.as_bytes())?;
        info!("Saved checkpoint at step {} in {:?}", step, &dir);

        self.prune()?;
        Ok(dir)
    }

    /// Steps of complete checkpoints in ascending order.
    pub fn steps(&self) -> Result<Vec<u64>> {
        if !self.save_dir.is_dir() {
            return Ok(vec![]);
        }
        let mut steps = vec![];
        for entry in fs::read_dir(&self.save_dir)? {
            let entry = entry?;
            let step = match entry.file_name().to_str().and_then(|s| s.parse::<u64>().ok()) {
                Some(step) => step,
                None => continue,
            };
            if entry.path().join(COUNTERS_FILE).is_file() {
                steps.push(step);
            } else {
                debug!("Skip incomplete checkpoint {:?}", entry.path());
            }
        }
        steps.sort_unstable();
        Ok(steps)
    }

    /// Largest step among the checkpoints.
    pub fn latest_step(&self) -> Result<Option<u64>> {
        Ok(self.steps()?.last().cloned())
    }

    /// Loads the checkpoint at `step` into `params` and returns its counters.
    ///
    /// Every variable in `params` must be present in the checkpoint.
    pub fn restore(&self, step: u64, params: &mut VarMap) -> Result<Counters> {
        let dir = self.step_dir(step);
        let counters_path = dir.join(COUNTERS_FILE);
        if !counters_path.is_file() {
            return Err(LwrlError::NoCheckpointFound(dir).into());
        }
        // Parsed before loading so a broken checkpoint leaves `params` untouched.
        let rdr = BufReader::new(File::open(&counters_path)?);
        let counters: Counters = serde_yaml::from_reader(rdr)?;
        params.load(dir.join(PARAMS_FILE))?;
        info!("Restored checkpoint at step {} from {:?}", step, &dir);
        Ok(counters)
    }

    /// Loads the latest checkpoint into `params`, returning its step and counters.
    pub fn restore_latest(&self, params: &mut VarMap) -> Result<(u64, Counters)> {
        match self.latest_step()? {
            Some(step) => Ok((step, self.restore(step, params)?)),
            None => Err(LwrlError::NoCheckpointFound(self.save_dir.clone()).into()),
        }
    }

    /// Removes the oldest checkpoints beyond `max_to_keep`.
    fn prune(&self) -> Result<()> {
        let max_to_keep = match self.max_to_keep {
            Some(n) => n,
            None => return Ok(()),
        };
        let steps = self.steps()?;
        if steps.len() <= max_to_keep {
            return Ok(());
        }
        for step in &steps[..steps.len() - max_to_keep] {
            let dir = self.step_dir(*step);
            fs::remove_dir_all(&dir)?;
            debug!("Removed checkpoint {:?}", dir);
        }
        Ok(())
    }
}
