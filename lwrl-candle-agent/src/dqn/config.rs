//! Configuration of DQN agent.
use crate::{util::CriticLoss, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_target_update_interval() -> usize {
    100
}

fn default_tau() -> f64 {
    1.0
}

/// Configuration of [`Dqn`](super::Dqn) agent.
///
/// `Q` is the configuration of the action-value network. Its input and
/// output dimensions are set from the model's observation shape and the
/// number of actions.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q> {
    /// Configuration of the action-value network.
    pub q_config: Q,

    /// Interval of target network updates in updates.
    #[serde(default = "default_target_update_interval")]
    pub target_update_interval: usize,

    /// Coefficient of the soft update of the target network. `1.0` copies.
    #[serde(default = "default_tau")]
    pub tau: f64,

    /// Selects next actions with the online network.
    #[serde(default)]
    pub double_dqn: bool,

    /// Loss on TD errors.
    #[serde(default)]
    pub critic_loss: CriticLoss,

    /// Device of the networks.
    #[serde(default)]
    pub device: Device,
}

impl<Q> DqnConfig<Q> {
    /// Constructs a configuration with default values.
    pub fn new(q_config: Q) -> Self {
        Self {
            q_config,
            target_update_interval: default_target_update_interval(),
            tau: default_tau(),
            double_dqn: false,
            critic_loss: CriticLoss::default(),
            device: Device::Cpu,
        }
    }

    /// Sets the interval of target network updates.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Enables double DQN.
    pub fn double_dqn(mut self, v: bool) -> Self {
        self.double_dqn = v;
        self
    }

    /// Sets the critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }
}

impl<Q> DqnConfig<Q>
where
    Q: Serialize + for<'de> Deserialize<'de>,
{
    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = DqnConfig::new(MlpConfig::new(0, vec![64, 64], 0, false))
            .target_update_interval(50)
            .tau(0.005)
            .double_dqn(true)
            .critic_loss(CriticLoss::SmoothL1);

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        config.save(&path)?;
        let config_ = DqnConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_minimal_yaml() -> Result<()> {
        let config: DqnConfig<MlpConfig> = serde_yaml::from_str("q_config:\n  units: [32]\n")?;
        assert_eq!(config, DqnConfig::new(MlpConfig::new(0, vec![32], 0, false)));
        Ok(())
    }
}
