//! Configuration of experiments.
//!
//! An experiment is described by two YAML files. The agent file holds the
//! model, the DQN agent (without its network) and the runner:
//!
//! ```yaml
//! model:
//!   exploration_schedule:
//!     type: linear
//!     args:
//!       initial_value: 1.0
//!       final_value: 0.05
//!       schedule_steps: 10000
//! dqn:
//!   target_update_interval: 100
//! runner:
//!   max_timesteps: 50000
//! ```
//!
//! The network file holds the action-value network, e.g. `units: [64, 64]`.
use anyhow::{Context, Result};
use lwrl_candle_agent::{dqn::DqnConfig, mlp::MlpConfig};
use lwrl_core::{checkpoint::SaverConfig, ModelConfig, RunnerConfig};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{fs, path::Path};

/// Configuration of an experiment.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExperimentConfig {
    /// Configuration of the model.
    pub model: ModelConfig,

    /// Configuration of the DQN agent with its network.
    pub dqn: DqnConfig<MlpConfig>,

    /// Configuration of the training and test loops.
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl ExperimentConfig {
    /// Composes a configuration from the contents of the agent and network files.
    pub fn from_yaml_strs(agent: &str, network: &str) -> Result<Self> {
        let mut agent: Value = if agent.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(agent).context("agent config")?
        };
        let network: Value = serde_yaml::from_str(network).context("network config")?;

        if agent.is_null() {
            agent = Value::Mapping(Mapping::new());
        }
        let root = agent
            .as_mapping_mut()
            .context("agent config must be a mapping")?;
        for key in ["model", "dqn"].iter() {
            if !root.contains_key(&Value::from(*key)) {
                root.insert(Value::from(*key), Value::Mapping(Mapping::new()));
            }
        }
        root.get_mut(&Value::from("dqn"))
            .and_then(Value::as_mapping_mut)
            .context("dqn in agent config must be a mapping")?
            .insert(Value::from("q_config"), network);

        Ok(serde_yaml::from_value(agent)?)
    }

    /// Loads the agent and network files.
    pub fn load(agent: impl AsRef<Path>, network: impl AsRef<Path>) -> Result<Self> {
        let agent_str = fs::read_to_string(agent.as_ref())
            .with_context(|| format!("failed to read {:?}", agent.as_ref()))?;
        let network_str = fs::read_to_string(network.as_ref())
            .with_context(|| format!("failed to read {:?}", network.as_ref()))?;
        Self::from_yaml_strs(&agent_str, &network_str)
    }

    /// Directs checkpoints to `save_dir`, keeping the other saver settings.
    pub fn save_dir(mut self, save_dir: impl AsRef<Path>) -> Self {
        let saver = match self.model.saver_spec.take() {
            Some(saver) => SaverConfig {
                save_dir: save_dir.as_ref().to_string_lossy().into_owned(),
                ..saver
            },
            None => SaverConfig::new(save_dir),
        };
        self.model.saver_spec = Some(saver);
        self
    }
}
