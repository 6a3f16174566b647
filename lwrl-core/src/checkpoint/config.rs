//! Configuration of [`CheckpointStore`](super::CheckpointStore).
use crate::error::LwrlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`CheckpointStore`](super::CheckpointStore).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SaverConfig {
    /// Root directory of checkpoints.
    pub save_dir: String,

    /// The number of checkpoints kept on disk. All are kept when `None`.
    #[serde(default)]
    pub max_to_keep: Option<usize>,
}

impl SaverConfig {
    /// Constructs a configuration keeping every checkpoint under `save_dir`.
    pub fn new(save_dir: impl AsRef<Path>) -> Self {
        Self {
            save_dir: save_dir.as_ref().to_string_lossy().into_owned(),
            max_to_keep: None,
        }
    }

    /// Sets the number of checkpoints kept on disk.
    pub fn max_to_keep(mut self, v: usize) -> Self {
        self.max_to_keep = Some(v);
        self
    }

    /// Checks the values.
    pub fn validate(&self) -> Result<()> {
        if self.save_dir.is_empty() {
            return Err(LwrlError::InvalidConfig("saver: save_dir is empty".to_string()).into());
        }
        if self.max_to_keep == Some(0) {
            return Err(
                LwrlError::InvalidConfig("saver: max_to_keep must be positive".to_string()).into(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_yaml() -> Result<()> {
        let config: SaverConfig = serde_yaml::from_str("save_dir: model/dqn\n")?;
        assert_eq!(config, SaverConfig::new("model/dqn"));

        let config = config.max_to_keep(3);
        let config2: SaverConfig = serde_yaml::from_str(&serde_yaml::to_string(&config)?)?;
        assert_eq!(config, config2);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(SaverConfig::new("").validate().is_err());
        assert!(SaverConfig::new("a").max_to_keep(0).validate().is_err());
        assert!(SaverConfig::new("a").max_to_keep(1).validate().is_ok());
    }
}
