use crate::model::IoDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
///
/// `in_dim` and `out_dim` may be omitted in YAML when the algorithm sets
/// them from the environment.
pub struct MlpConfig {
    #[serde(default)]
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    #[serde(default)]
    pub(super) out_dim: usize,
    #[serde(default)]
    pub(super) activation_out: bool,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `activation_out` - If `true`, activation function is added in the final layer.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize, activation_out: bool) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation_out,
        }
    }

    /// Sizes of the hidden layers.
    pub fn units(&self) -> &[usize] {
        &self.units
    }
}

impl IoDim for MlpConfig {
    fn get_in_dim(&self) -> usize {
        self.in_dim
    }

    fn set_in_dim(&mut self, v: usize) {
        self.in_dim = v;
    }

    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, out_dim: usize) {
        self.out_dim = out_dim;
    }
}
