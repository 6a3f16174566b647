//! Interface of neural networks used in algorithms.
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarBuilder;

/// Neural network model not owning its [`VarMap`] internally.
///
/// Parameters are created in the [`VarMap`] behind the given [`VarBuilder`],
/// so the owner of the [`VarMap`] can save, load and optimize them.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel: Sized {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Builds [`SubModel`] with [`VarBuilder`] and [`SubModel::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>;

    /// Forward pass on a batch.
    fn forward(&self, xs: &Tensor) -> Result<Tensor>;
}

/// Interface for handling input and output dimensions of a network.
///
/// Dimensions are usually given by the environment and set just before the
/// network is built.
pub trait IoDim {
    /// Returns the input dimension.
    fn get_in_dim(&self) -> usize;

    /// Sets the input dimension.
    fn set_in_dim(&mut self, v: usize);

    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}
