//! Batch.
use super::Action;
use crate::error::LwrlError;
use anyhow::Result;
use ndarray::ArrayD;

/// A batch of transitions `(o_t, a_t, o_t+1, r_t, is_done_t)`.
///
/// Observations are raw, i.e., not preprocessed.
#[derive(Debug, Clone, Default)]
pub struct TransitionBatch {
    /// `o_t`.
    pub obs: Vec<ArrayD<f32>>,

    /// `a_t`.
    pub act: Vec<Action>,

    /// `o_t+1`.
    pub next_obs: Vec<ArrayD<f32>>,

    /// `r_t`.
    pub reward: Vec<f32>,

    /// `is_done_t`, `1` if the episode ended at the transition.
    pub is_done: Vec<i8>,
}

impl TransitionBatch {
    /// Constructs an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
        }
    }

    /// Appends a transition.
    pub fn push(
        &mut self,
        obs: ArrayD<f32>,
        act: Action,
        next_obs: ArrayD<f32>,
        reward: f32,
        is_done: bool,
    ) {
        self.obs.push(obs);
        self.act.push(act);
        self.next_obs.push(next_obs);
        self.reward.push(reward);
        self.is_done.push(is_done as i8);
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.obs.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails if the batch is empty or its components have different lengths.
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        if n == 0 {
            return Err(LwrlError::EmptyBatch.into());
        }
        let lens = [
            ("act", self.act.len()),
            ("next_obs", self.next_obs.len()),
            ("reward", self.reward.len()),
            ("is_done", self.is_done.len()),
        ];
        for (name, len) in lens.iter() {
            if *len != n {
                return Err(LwrlError::InconsistentBatch(format!(
                    "{} has {} elements, obs has {}",
                    name, len, n
                ))
                .into());
            }
        }
        Ok(())
    }
}
