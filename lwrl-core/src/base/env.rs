//! Environment.
use super::{Action, ActionSpec, StateSpec};
use anyhow::Result;
use ndarray::ArrayD;

/// Result of an environment step.
#[derive(Debug, Clone)]
pub struct Step {
    /// Observation after the step.
    pub obs: ArrayD<f32>,

    /// Reward of the step.
    pub reward: f32,

    /// Flag denoting if the episode ended, by termination or truncation.
    pub is_done: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(obs: ArrayD<f32>, reward: f32, is_done: bool) -> Self {
        Self {
            obs,
            reward,
            is_done,
        }
    }
}

/// Represents an environment, typically an MDP.
///
/// [`Model`](crate::Model) only consumes the specs; stepping and resetting
/// is driven by [`Runner`](crate::Runner).
pub trait Env {
    /// Shape of observations.
    fn state_spec(&self) -> StateSpec;

    /// Kind and range of actions.
    fn action_spec(&self) -> ActionSpec;

    /// Starts a new episode and returns the initial observation.
    fn reset(&mut self) -> Result<ArrayD<f32>>;

    /// Performs an environment step.
    fn step(&mut self, act: &Action) -> Result<Step>;
}
