//! A fixed-decision algorithm used in tests.
//!
//! [`DummyAlgorithm`] always decides the configured action and holds a single
//! trainable scalar `w`, incremented by one on every successful update. Its
//! hooks can be made to fail on demand. [`DummyEnv`] runs episodes of a
//! fixed length with reward `1` per step.
use crate::{
    record::{Record, RecordValue},
    Action, ActionSpec, Algorithm, Env, LearnContext, Setup, StateSpec, Step, TransitionBatch,
};
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Init, VarMap};
use ndarray::ArrayD;

const PARAM_NAME: &str = "w";

/// Configuration of [`DummyAlgorithm`].
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Decided action.
    pub action: Action,

    /// [`Algorithm::learn`] fails if `true`.
    pub fail_learn: bool,

    /// [`Algorithm::observe`] fails if `true`.
    pub fail_observe: bool,
}

impl DummyConfig {
    /// Always decides `action`.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            fail_learn: false,
            fail_observe: false,
        }
    }

    /// Makes updates fail.
    pub fn fail_learn(mut self, v: bool) -> Self {
        self.fail_learn = v;
        self
    }

    /// Makes observations fail.
    pub fn fail_observe(mut self, v: bool) -> Self {
        self.fail_observe = v;
        self
    }
}

/// An algorithm with a fixed decision.
pub struct DummyAlgorithm {
    config: DummyConfig,
    obs_shape: Vec<usize>,
    params: VarMap,
    n_observed: usize,
    n_restored: usize,
    last_discount_factor: Option<f64>,
}

impl DummyAlgorithm {
    /// Shape of observations given at build time.
    pub fn obs_shape(&self) -> &[usize] {
        &self.obs_shape
    }

    /// Current value of the trainable scalar.
    pub fn weight(&self) -> Result<f32> {
        let data = self.params.data().lock().map_err(|e| anyhow!("{}", e))?;
        let var = data
            .get(PARAM_NAME)
            .ok_or_else(|| anyhow!("missing variable {}", PARAM_NAME))?;
        Ok(var.as_tensor().to_vec1::<f32>()?[0])
    }

    /// Sets the trainable scalar.
    pub fn set_weight(&self, value: f32) -> Result<()> {
        let data = self.params.data().lock().map_err(|e| anyhow!("{}", e))?;
        let var = data
            .get(PARAM_NAME)
            .ok_or_else(|| anyhow!("missing variable {}", PARAM_NAME))?;
        var.set(&Tensor::from_slice(&[value], (1,), &Device::Cpu)?)?;
        Ok(())
    }

    /// Number of [`Algorithm::observe`] calls.
    pub fn n_observed(&self) -> usize {
        self.n_observed
    }

    /// Number of [`Algorithm::on_restore`] calls.
    pub fn n_restored(&self) -> usize {
        self.n_restored
    }

    /// Discount factor seen by the last update.
    pub fn last_discount_factor(&self) -> Option<f64> {
        self.last_discount_factor
    }
}

impl Algorithm for DummyAlgorithm {
    type Config = DummyConfig;

    fn build(config: Self::Config, setup: &Setup) -> Result<Self> {
        let params = VarMap::new();
        params.get((1,), PARAM_NAME, Init::Const(0.0), DType::F32, &Device::Cpu)?;
        Ok(Self {
            config,
            obs_shape: setup.obs_shape.clone(),
            params,
            n_observed: 0,
            n_restored: 0,
            last_discount_factor: None,
        })
    }

    fn decide(&self, _obs: &ArrayD<f32>) -> Result<Action> {
        Ok(self.config.action.clone())
    }

    fn observe(
        &mut self,
        _obs: &ArrayD<f32>,
        _act: &Action,
        _reward: f32,
        _is_done: bool,
    ) -> Result<()> {
        if self.config.fail_observe {
            return Err(anyhow!("observe failed"));
        }
        self.n_observed += 1;
        Ok(())
    }

    fn learn(&mut self, batch: &TransitionBatch, ctx: &LearnContext) -> Result<Record> {
        if self.config.fail_learn {
            return Err(anyhow!("learn failed"));
        }
        self.set_weight(self.weight()? + 1.0)?;
        self.last_discount_factor = Some(ctx.discount_factor);
        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(0.0)),
            ("batch_size", RecordValue::Scalar(batch.len() as f32)),
        ]))
    }

    fn params(&self) -> &VarMap {
        &self.params
    }

    fn params_mut(&mut self) -> &mut VarMap {
        &mut self.params
    }

    fn on_restore(&mut self) -> Result<()> {
        self.n_restored += 1;
        Ok(())
    }
}

/// An environment with fixed-length episodes.
///
/// Observations have shape `[4]`, filled with the step count in the episode.
/// Every step gives reward `1`.
pub struct DummyEnv {
    episode_length: usize,
    t: usize,
}

impl DummyEnv {
    /// Episodes end after `episode_length` steps.
    pub fn new(episode_length: usize) -> Self {
        Self {
            episode_length,
            t: 0,
        }
    }

    fn obs(&self) -> ArrayD<f32> {
        ArrayD::from_elem(vec![4], self.t as f32)
    }
}

impl Env for DummyEnv {
    fn state_spec(&self) -> StateSpec {
        StateSpec::new(vec![4])
    }

    fn action_spec(&self) -> ActionSpec {
        ActionSpec::discrete(2)
    }

    fn reset(&mut self) -> Result<ArrayD<f32>> {
        self.t = 0;
        Ok(self.obs())
    }

    fn step(&mut self, act: &Action) -> Result<Step> {
        self.action_spec().check(act)?;
        self.t += 1;
        Ok(Step::new(self.obs(), 1.0, self.t >= self.episode_length))
    }
}
