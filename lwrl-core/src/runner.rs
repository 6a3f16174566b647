//! Training and evaluation loops.
mod config;
use crate::{
    record::{Record, RecordValue},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
    Algorithm, Env, Model, Step,
};
use anyhow::Result;
pub use config::RunnerConfig;
use log::{debug, info};

/// Drives a [`Model`] in an [`Env`].
///
/// Training interleaves acting in the environment with updates on batches
/// sampled from a [`SimpleReplayBuffer`] of raw transitions:
///
/// 1. The observation is preprocessed and an action is selected with
///    exploration.
/// 2. The environment is stepped and the model observes the transition,
///    advancing its timestep.
/// 3. The raw transition is pushed to the replay buffer.
/// 4. After the warmup period, every `update_interval` environment steps,
///    the model is updated on a sampled batch.
/// 5. Every `save_interval` updates, the model is saved at its timestep.
///
/// Training runs until the model's timestep reaches `max_timesteps`, so a
/// restored model continues from its stored timestep.
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Constructs a runner.
    pub fn build(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Trains the model and saves it at the end.
    ///
    /// Returns a summary with the number of finished episodes, the return of
    /// the last finished episode and the final counters.
    pub fn train<E: Env, A: Algorithm>(&self, env: &mut E, model: &mut Model<A>) -> Result<Record> {
        let config = &self.config;
        let mut buffer = SimpleReplayBuffer::build(
            &SimpleReplayBufferConfig::default()
                .capacity(config.replay_capacity)
                .seed(config.seed),
        )?;
        let mut n_episodes = 0usize;
        let mut episode_return = 0f32;
        let mut last_return = None;

        info!(
            "Start training from timestep {} to {}",
            model.timestep(),
            config.max_timesteps
        );
        model.reset();
        let mut obs = env.reset()?;

        while model.timestep() < config.max_timesteps {
            let processed = model.preprocess(&obs)?;
            let (act, _) = model.act_processed(&processed, true)?;
            let Step {
                obs: next_obs,
                reward,
                is_done,
            } = env.step(&act)?;
            model.observe(&processed, &act, reward, is_done)?;
            buffer.push(obs, act, next_obs.clone(), reward, is_done);
            episode_return += reward;

            obs = if is_done {
                n_episodes += 1;
                debug!("Episode {}: return {}", n_episodes, episode_return);
                last_return = Some(episode_return);
                episode_return = 0.0;
                model.reset();
                env.reset()?
            } else {
                next_obs
            };

            let timestep = model.timestep();
            if timestep > config.warmup_period && timestep % config.update_interval == 0 {
                let batch = buffer.batch(config.batch_size)?;
                let mut record = model.update(&batch)?;
                let num_updates = model.num_updates();

                if config.log_interval > 0 && num_updates % config.log_interval == 0 {
                    record.insert("timestep", RecordValue::Scalar(timestep as f32));
                    record.insert("episodes", RecordValue::Scalar(n_episodes as f32));
                    if let Some(value) = model.exploration_value() {
                        record.insert("exploration", RecordValue::Scalar(value as f32));
                    }
                    if let Some(r) = last_return {
                        record.insert("episode_return", RecordValue::Scalar(r));
                    }
                    info!("Update {}: {}", num_updates, record);
                }

                if config.save_interval > 0 && num_updates % config.save_interval == 0 {
                    model.save(timestep)?;
                }
            }
        }

        model.save(model.timestep())?;
        info!(
            "Finished training: {} episodes, timestep {}, {} updates",
            n_episodes,
            model.timestep(),
            model.num_updates()
        );

        let mut summary = Record::from_slice(&[
            ("episodes", RecordValue::Scalar(n_episodes as f32)),
            ("timestep", RecordValue::Scalar(model.timestep() as f32)),
            ("num_updates", RecordValue::Scalar(model.num_updates() as f32)),
        ]);
        if let Some(r) = last_return {
            summary.insert("episode_return", RecordValue::Scalar(r));
        }
        Ok(summary)
    }

    /// Runs `test_episodes` episodes without exploration and returns their
    /// returns.
    ///
    /// The model's counters are not advanced.
    pub fn test<E: Env, A: Algorithm>(&self, env: &mut E, model: &mut Model<A>) -> Result<Vec<f32>> {
        let mut returns = Vec::with_capacity(self.config.test_episodes);
        for ix in 0..self.config.test_episodes {
            model.reset();
            let mut obs = env.reset()?;
            let mut episode_return = 0f32;
            loop {
                let (act, _) = model.act(&obs, false)?;
                let step = env.step(&act)?;
                episode_return += step.reward;
                if step.is_done {
                    break;
                }
                obs = step.obs;
            }
            info!("Test episode {}: return {}", ix, episode_return);
            returns.push(episode_return);
        }
        Ok(returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checkpoint::SaverConfig,
        dummy::{DummyAlgorithm, DummyConfig, DummyEnv},
        Action, ModelConfig,
    };
    use tempdir::TempDir;

    fn model(config: ModelConfig, env: &DummyEnv) -> Result<Model<DummyAlgorithm>> {
        Model::build(
            config,
            env.state_spec(),
            env.action_spec(),
            DummyConfig::new(Action::Discrete(1)),
        )
    }

    #[test]
    fn test_train() -> Result<()> {
        let mut env = DummyEnv::new(5);
        let mut model = model(ModelConfig::default(), &env)?;
        let runner = Runner::build(
            RunnerConfig::default()
                .max_timesteps(20)
                .warmup_period(10)
                .update_interval(2)
                .batch_size(4),
        )?;
        let summary = runner.train(&mut env, &mut model)?;

        assert_eq!(model.timestep(), 20);
        // updates at timesteps 12, 14, ..., 20
        assert_eq!(model.num_updates(), 5);
        assert_eq!(model.algorithm().weight()?, 5.0);
        assert_eq!(model.algorithm().n_observed(), 20);
        assert_eq!(summary.get_scalar("episodes")?, 4.0);
        assert_eq!(summary.get_scalar("episode_return")?, 5.0);
        Ok(())
    }

    #[test]
    fn test_test_keeps_counters() -> Result<()> {
        let mut env = DummyEnv::new(3);
        let mut model = model(ModelConfig::default(), &env)?;
        let runner = Runner::build(RunnerConfig::default().test_episodes(2))?;
        let returns = runner.test(&mut env, &mut model)?;
        assert_eq!(returns, vec![3.0, 3.0]);
        assert_eq!(model.timestep(), 0);
        assert_eq!(model.num_updates(), 0);
        Ok(())
    }

    #[test]
    fn test_train_saves_checkpoints() -> Result<()> {
        let dir = TempDir::new("runner")?;
        let mut env = DummyEnv::new(4);
        let config = ModelConfig::default().saver_spec(SaverConfig::new(dir.path()));
        let mut model = model(config, &env)?;
        let runner = Runner::build(
            RunnerConfig::default()
                .max_timesteps(12)
                .warmup_period(2)
                .batch_size(2)
                .save_interval(5),
        )?;
        runner.train(&mut env, &mut model)?;

        // 10 updates at timesteps 3..=12, saves after updates 5 and 10, then the final save.
        let store = model.store().unwrap();
        assert_eq!(store.steps()?, vec![7, 12]);
        Ok(())
    }
}
