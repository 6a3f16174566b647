//! Algorithm.
use super::{Action, ActionSpec, StateSpec, TransitionBatch};
use crate::{opt::OptimizerBuilder, preprocess::Pipeline, record::Record};
use anyhow::Result;
use candle_nn::VarMap;
use ndarray::ArrayD;

/// Information available to an [`Algorithm`] while it is being built.
pub struct Setup<'a> {
    /// Shape of raw observations.
    pub state_spec: &'a StateSpec,

    /// Shape of observations after the preprocessing pipeline.
    pub obs_shape: Vec<usize>,

    /// Kind and range of actions.
    pub action_spec: &'a ActionSpec,

    /// Discount factor.
    pub discount_factor: f64,

    /// Builds the optimizer once the trainable parameters exist.
    pub optimizer: &'a OptimizerBuilder,
}

/// Information available to [`Algorithm::learn`].
pub struct LearnContext<'a> {
    /// Discount factor.
    pub discount_factor: f64,

    /// Number of observed environment steps.
    pub timestep: u64,

    /// Number of completed updates, not including the current one.
    pub num_updates: u64,

    /// Preprocessing pipeline of the model.
    pub pipeline: &'a Pipeline,
}

impl<'a> LearnContext<'a> {
    /// Applies the preprocessing pipeline to a raw observation without
    /// updating stateful steps.
    pub fn preprocess(&self, obs: &ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.pipeline.transform(obs.clone())
    }
}

/// The decision and update math of a concrete RL algorithm.
///
/// [`Model`](crate::Model) owns preprocessing, exploration, counting and
/// persistence; an implementation of this trait supplies the rest.
pub trait Algorithm: Sized {
    /// Configuration.
    type Config: Clone;

    /// Creates trainable parameters, then the optimizer from
    /// [`Setup::optimizer`].
    fn build(config: Self::Config, setup: &Setup) -> Result<Self>;

    /// Selects an action for a preprocessed observation.
    ///
    /// Must not change trainable parameters.
    fn decide(&self, obs: &ArrayD<f32>) -> Result<Action>;

    /// Step-local bookkeeping, called before the model advances its timestep.
    #[allow(unused_variables)]
    fn observe(
        &mut self,
        obs: &ArrayD<f32>,
        act: &Action,
        reward: f32,
        is_done: bool,
    ) -> Result<()> {
        Ok(())
    }

    /// Performs a parameter update with raw transitions.
    fn learn(&mut self, batch: &TransitionBatch, ctx: &LearnContext) -> Result<Record>;

    /// Trainable parameters.
    fn params(&self) -> &VarMap;

    /// Trainable parameters, for restoring from a checkpoint.
    fn params_mut(&mut self) -> &mut VarMap;

    /// Called after parameters were loaded from a checkpoint.
    fn on_restore(&mut self) -> Result<()> {
        Ok(())
    }
}
