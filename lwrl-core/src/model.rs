//! Trainable agent.
mod config;
use crate::{
    checkpoint::{CheckpointStore, Counters},
    error::LwrlError,
    opt::OptimizerBuilder,
    preprocess::Pipeline,
    record::Record,
    schedule::ScheduleConfig,
    Action, ActionSpec, Algorithm, LearnContext, Setup, StateSpec, TransitionBatch,
};
use anyhow::Result;
pub use config::ModelConfig;
use log::{debug, info, trace};
use ndarray::ArrayD;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// A trainable agent.
///
/// Wraps an [`Algorithm`] with the machinery every algorithm shares:
/// validating and preprocessing observations, perturbing actions on an
/// exploration schedule, counting environment steps and updates, and
/// saving/restoring parameters together with the counters.
///
/// The two counters only move forward: `timestep` by one on each
/// successful [`Model::observe`], `num_updates` by one on each successful
/// [`Model::update`]. A failed call leaves them untouched. [`Model::restore`]
/// overwrites both with the values stored in the checkpoint.
pub struct Model<A: Algorithm> {
    state_spec: StateSpec,
    action_spec: ActionSpec,
    obs_shape: Vec<usize>,
    schedule: Option<ScheduleConfig>,
    pipeline: Pipeline,
    optimizer: OptimizerBuilder,
    store: Option<CheckpointStore>,
    discount_factor: f64,
    rng: SmallRng,
    timestep: u64,
    num_updates: u64,
    algorithm: A,
}

impl<A: Algorithm> Model<A> {
    /// Constructs a model and its algorithm.
    ///
    /// Fails with [`LwrlError::InvalidActionSpec`] for a malformed action spec
    /// and with [`LwrlError::InvalidConfig`] for out-of-range settings, e.g.,
    /// a discount factor outside `(0, 1]`.
    pub fn build(
        config: ModelConfig,
        state_spec: StateSpec,
        action_spec: ActionSpec,
        algorithm_config: A::Config,
    ) -> Result<Self> {
        action_spec.validate()?;
        if !(config.discount_factor > 0.0 && config.discount_factor <= 1.0) {
            return Err(LwrlError::InvalidConfig(format!(
                "discount_factor must be in (0, 1], got {}",
                config.discount_factor
            ))
            .into());
        }
        if let Some(schedule) = &config.exploration_schedule {
            schedule.validate()?;
        }
        let pipeline = Pipeline::build(&config.state_preprocess_pipeline)?;
        let optimizer = OptimizerBuilder::new(config.optimizer)?;
        let store = match &config.saver_spec {
            Some(saver_spec) => Some(CheckpointStore::build(saver_spec)?),
            None => None,
        };
        let obs_shape = pipeline.output_shape(&state_spec.shape);

        let algorithm = A::build(
            algorithm_config,
            &Setup {
                state_spec: &state_spec,
                obs_shape: obs_shape.clone(),
                action_spec: &action_spec,
                discount_factor: config.discount_factor,
                optimizer: &optimizer,
            },
        )?;
        info!(
            "Built model: state shape {:?} -> {:?}, {:?}",
            state_spec.shape, obs_shape, action_spec
        );

        Ok(Self {
            state_spec,
            action_spec,
            obs_shape,
            schedule: config.exploration_schedule,
            pipeline,
            optimizer,
            store,
            discount_factor: config.discount_factor,
            rng: SmallRng::seed_from_u64(config.seed),
            timestep: 0,
            num_updates: 0,
            algorithm,
        })
    }

    /// Checks the shape of a raw observation and applies the preprocessing
    /// pipeline, updating stateful steps.
    pub fn preprocess(&mut self, obs: &ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.state_spec.check_shape(obs.shape())?;
        self.pipeline.process(obs.clone())
    }

    /// Selects an action for a raw observation.
    ///
    /// Returns the action and the timestep it was selected at. The timestep
    /// is not advanced; see [`Model::observe`].
    pub fn act(&mut self, obs: &ArrayD<f32>, allow_exploration: bool) -> Result<(Action, u64)> {
        let obs = self.preprocess(obs)?;
        self.act_processed(&obs, allow_exploration)
    }

    /// Selects an action for an observation already passed through
    /// [`Model::preprocess`].
    pub fn act_processed(
        &mut self,
        obs: &ArrayD<f32>,
        allow_exploration: bool,
    ) -> Result<(Action, u64)> {
        let action = self.algorithm.decide(obs)?;
        self.action_spec.check(&action)?;
        let action = match (&self.schedule, allow_exploration) {
            (Some(schedule), true) => {
                let value = schedule.value(self.timestep);
                self.explore(action, value)
            }
            _ => action,
        };
        trace!("timestep {}: {:?}", self.timestep, action);
        Ok((action, self.timestep))
    }

    fn explore(&mut self, action: Action, value: f64) -> Action {
        match (&self.action_spec, action) {
            (ActionSpec::Discrete { num_actions }, action) => {
                if self.rng.gen::<f64>() < value {
                    Action::Discrete(self.rng.gen_range(0..*num_actions))
                } else {
                    action
                }
            }
            (ActionSpec::Continuous { .. }, Action::Continuous(v)) => {
                let v = v.into_iter().map(|x| x + value as f32).collect();
                self.action_spec.clamp(Action::Continuous(v))
            }
            // Rejected by `ActionSpec::check` before exploration.
            (ActionSpec::Continuous { .. }, action) => action,
        }
    }

    /// Notifies the algorithm of a transition and advances the timestep by one.
    ///
    /// `obs` is the preprocessed observation the action was selected for.
    /// Transitions are not stored here; the runner owns the replay buffer.
    pub fn observe(
        &mut self,
        obs: &ArrayD<f32>,
        act: &Action,
        reward: f32,
        is_done: bool,
    ) -> Result<()> {
        self.algorithm.observe(obs, act, reward, is_done)?;
        self.timestep += 1;
        Ok(())
    }

    /// Performs one parameter update on a batch of raw transitions.
    ///
    /// Fails with [`LwrlError::EmptyBatch`] or [`LwrlError::InconsistentBatch`]
    /// before the algorithm is called. `num_updates` is incremented only
    /// when the algorithm succeeds.
    pub fn update(&mut self, batch: &TransitionBatch) -> Result<Record> {
        batch.validate()?;
        let ctx = LearnContext {
            discount_factor: self.discount_factor,
            timestep: self.timestep,
            num_updates: self.num_updates,
            pipeline: &self.pipeline,
        };
        let record = self.algorithm.learn(batch, &ctx)?;
        self.num_updates += 1;
        Ok(record)
    }

    /// Saves parameters and counters under `step`.
    ///
    /// Does nothing when no checkpoint store is configured.
    pub fn save(&self, step: u64) -> Result<()> {
        match &self.store {
            Some(store) => {
                store.save(step, self.algorithm.params(), &self.counters())?;
            }
            None => debug!("No checkpoint store, skip saving at step {}", step),
        }
        Ok(())
    }

    /// Restores parameters and counters from the latest checkpoint and
    /// returns its step.
    ///
    /// Fails with [`LwrlError::NotConfigured`] without a checkpoint store and
    /// with [`LwrlError::NoCheckpointFound`] when the store is empty.
    pub fn restore(&mut self) -> Result<u64> {
        let store = self.store.as_ref().ok_or(LwrlError::NotConfigured)?;
        let (step, counters) = store.restore_latest(self.algorithm.params_mut())?;
        self.algorithm.on_restore()?;
        self.set_counters(counters);
        Ok(step)
    }

    /// Restores parameters and counters from the checkpoint at `step`.
    pub fn restore_step(&mut self, step: u64) -> Result<()> {
        let store = self.store.as_ref().ok_or(LwrlError::NotConfigured)?;
        let counters = store.restore(step, self.algorithm.params_mut())?;
        self.algorithm.on_restore()?;
        self.set_counters(counters);
        Ok(())
    }

    fn set_counters(&mut self, counters: Counters) {
        info!(
            "Counters restored: timestep {} -> {}, num_updates {} -> {}",
            self.timestep, counters.timestep, self.num_updates, counters.num_updates
        );
        self.timestep = counters.timestep;
        self.num_updates = counters.num_updates;
    }

    /// Resets stateful preprocessing steps at the start of an episode.
    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    /// Exploration value at the current timestep, `None` without a schedule.
    pub fn exploration_value(&self) -> Option<f64> {
        self.schedule.as_ref().map(|s| s.value(self.timestep))
    }

    /// Number of observed environment steps.
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Number of completed updates.
    pub fn num_updates(&self) -> u64 {
        self.num_updates
    }

    /// Both counters.
    pub fn counters(&self) -> Counters {
        Counters {
            timestep: self.timestep,
            num_updates: self.num_updates,
        }
    }

    /// State spec.
    pub fn state_spec(&self) -> &StateSpec {
        &self.state_spec
    }

    /// Action spec.
    pub fn action_spec(&self) -> &ActionSpec {
        &self.action_spec
    }

    /// Shape of preprocessed observations.
    pub fn obs_shape(&self) -> &[usize] {
        &self.obs_shape
    }

    /// Discount factor.
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Optimizer builder handed to the algorithm.
    pub fn optimizer(&self) -> &OptimizerBuilder {
        &self.optimizer
    }

    /// Checkpoint store, if configured.
    pub fn store(&self) -> Option<&CheckpointStore> {
        self.store.as_ref()
    }

    /// Preprocessing pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The wrapped algorithm.
    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// The wrapped algorithm.
    pub fn algorithm_mut(&mut self) -> &mut A {
        &mut self.algorithm
    }
}
