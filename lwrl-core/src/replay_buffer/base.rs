use super::SimpleReplayBufferConfig;
use crate::{error::LwrlError, Action, TransitionBatch};
use anyhow::Result;
use ndarray::ArrayD;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// A ring buffer of transitions with uniform sampling.
///
/// Once full, new transitions overwrite the oldest ones.
pub struct SimpleReplayBuffer {
    capacity: usize,
    i: usize,
    obs: Vec<ArrayD<f32>>,
    act: Vec<Action>,
    next_obs: Vec<ArrayD<f32>>,
    reward: Vec<f32>,
    is_done: Vec<i8>,
    rng: SmallRng,
}

impl SimpleReplayBuffer {
    /// Constructs an empty replay buffer.
    pub fn build(config: &SimpleReplayBufferConfig) -> Result<Self> {
        let capacity = config.capacity;
        if capacity == 0 {
            return Err(LwrlError::InvalidConfig(
                "replay buffer: capacity must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            capacity,
            i: 0,
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// The maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Stores a transition.
    pub fn push(
        &mut self,
        obs: ArrayD<f32>,
        act: Action,
        next_obs: ArrayD<f32>,
        reward: f32,
        is_done: bool,
    ) {
        let is_done = is_done as i8;
        if self.len() < self.capacity {
            self.obs.push(obs);
            self.act.push(act);
            self.next_obs.push(next_obs);
            self.reward.push(reward);
            self.is_done.push(is_done);
        } else {
            let i = self.i;
            self.obs[i] = obs;
            self.act[i] = act;
            self.next_obs[i] = next_obs;
            self.reward[i] = reward;
            self.is_done[i] = is_done;
        }
        self.i = (self.i + 1) % self.capacity;
    }

    /// Samples `size` transitions uniformly with replacement.
    ///
    /// Fails with [`LwrlError::EmptyBatch`] if the buffer is empty.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch> {
        if self.is_empty() {
            return Err(LwrlError::EmptyBatch.into());
        }
        let n = self.len();
        let mut batch = TransitionBatch::with_capacity(size);
        for _ in 0..size {
            let ix = self.rng.gen_range(0..n);
            batch.push(
                self.obs[ix].clone(),
                self.act[ix].clone(),
                self.next_obs[ix].clone(),
                self.reward[ix],
                self.is_done[ix] != 0,
            );
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn push_n(buffer: &mut SimpleReplayBuffer, n: usize) {
        for k in 0..n {
            let obs = arr1(&[k as f32]).into_dyn();
            let next_obs = arr1(&[k as f32 + 1.0]).into_dyn();
            buffer.push(obs, Action::Discrete(k % 2), next_obs, k as f32, k % 5 == 4);
        }
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() -> Result<()> {
        let mut buffer = SimpleReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(3))?;
        push_n(&mut buffer, 5);
        assert_eq!(buffer.len(), 3);

        let batch = buffer.batch(64)?;
        assert_eq!(batch.len(), 64);
        // Transitions 0 and 1 were overwritten by 3 and 4.
        assert!(batch.reward.iter().all(|r| *r >= 2.0));
        for (obs, reward) in batch.obs.iter().zip(batch.reward.iter()) {
            assert_eq!(obs.iter().next().cloned(), Some(*reward));
        }
        batch.validate()?;
        Ok(())
    }

    #[test]
    fn test_empty_buffer() -> Result<()> {
        let mut buffer = SimpleReplayBuffer::build(&SimpleReplayBufferConfig::default())?;
        let err = buffer.batch(1).unwrap_err();
        assert!(matches!(err.downcast_ref::<LwrlError>(), Some(LwrlError::EmptyBatch)));
        assert!(SimpleReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(0)).is_err());
        Ok(())
    }

    #[test]
    fn test_seeded_sampling() -> Result<()> {
        let config = SimpleReplayBufferConfig::default().seed(7);
        let mut b1 = SimpleReplayBuffer::build(&config)?;
        let mut b2 = SimpleReplayBuffer::build(&config)?;
        push_n(&mut b1, 20);
        push_n(&mut b2, 20);
        assert_eq!(b1.batch(16)?.reward, b2.batch(16)?.reward);
        Ok(())
    }
}
