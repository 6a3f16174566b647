//! Optimizers.
//!
//! Optimizers are built lazily: an [`OptimizerBuilder`] is created with the
//! model and invoked by the algorithm once its trainable parameters exist.
use crate::error::LwrlError;
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW, SGD};
use candle_optimisers::adam::{Adam, ParamsAdam};
use log::debug;
use serde::{Deserialize, Serialize};

/// Learning rate of the default optimizer.
pub const DEFAULT_LEARNING_RATE: f64 = 0.00025;

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

/// Configuration of optimizer, written as `{type: name, args: {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// AdamW optimizer.
    #[serde(rename = "adamw")]
    AdamW {
        /// Learning rate.
        lr: f64,
        #[serde(default = "default_beta1")]
        /// Coefficient of the running mean of gradients.
        beta1: f64,
        #[serde(default = "default_beta2")]
        /// Coefficient of the running mean of squared gradients.
        beta2: f64,
        #[serde(default = "default_eps")]
        /// Added to the denominator.
        eps: f64,
        #[serde(default = "default_weight_decay")]
        /// Decoupled weight decay.
        weight_decay: f64,
    },

    /// Stochastic gradient descent.
    Sgd {
        /// Learning rate.
        lr: f64,
    },
}

/// Adam with learning rate [`DEFAULT_LEARNING_RATE`].
impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: DEFAULT_LEARNING_RATE,
        }
    }
}

impl OptimizerConfig {
    /// Returns the learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::Adam { lr } | Self::AdamW { lr, .. } | Self::Sgd { lr } => *lr,
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam { .. } => Self::Adam { lr },
            Self::AdamW {
                beta1,
                beta2,
                eps,
                weight_decay,
                ..
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Sgd { .. } => Self::Sgd { lr },
        }
    }

    /// Checks parameters of the optimizer.
    pub fn validate(&self) -> Result<()> {
        let lr = self.lr();
        if !(lr > 0.0) {
            return Err(LwrlError::InvalidConfig(format!(
                "optimizer: learning rate must be positive, got {}",
                lr
            ))
            .into());
        }
        Ok(())
    }

    /// Constructs the optimizer on the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Sgd { lr } => {
                let opt = SGD::new(vars, *lr)?;
                Ok(Optimizer::Sgd(opt))
            }
        }
    }
}

/// Deferred constructor of the optimizer.
///
/// Holds the configuration from model setup until the algorithm calls
/// [`OptimizerBuilder::build`] with its trainable parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizerBuilder {
    config: OptimizerConfig,
}

impl OptimizerBuilder {
    /// Constructs a builder. `None` selects the default optimizer.
    pub fn new(config: Option<OptimizerConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration of the optimizer to be built.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Builds the optimizer on the given trainable parameters.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        debug!("Build optimizer {:?} on {} variables", self.config, vars.len());
        self.config.build(vars)
    }
}

/// Optimizers.
///
/// This is a thin wrapper of optimizers of [candle_nn] and [candle_optimisers].
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Adam),

    /// AdamW optimizer.
    AdamW(AdamW),

    /// Stochastic gradient descent.
    Sgd(SGD),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Sgd(opt) => Ok(opt.backward_step(loss)?),
        }
    }

    /// Current learning rate.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam(opt) => opt.learning_rate(),
            Self::AdamW(opt) => opt.learning_rate(),
            Self::Sgd(opt) => opt.learning_rate(),
        }
    }

    /// Sets the learning rate.
    pub fn set_learning_rate(&mut self, lr: f64) {
        match self {
            Self::Adam(opt) => opt.set_learning_rate(lr),
            Self::AdamW(opt) => opt.set_learning_rate(lr),
            Self::Sgd(opt) => opt.set_learning_rate(lr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_default_is_adam() -> Result<()> {
        let builder = OptimizerBuilder::new(None)?;
        assert_eq!(
            builder.config(),
            &OptimizerConfig::Adam {
                lr: DEFAULT_LEARNING_RATE
            }
        );
        Ok(())
    }

    #[test]
    fn test_serde_yaml() -> Result<()> {
        let config: OptimizerConfig = serde_yaml::from_str("type: adam\nargs:\n  lr: 0.001\n")?;
        assert_eq!(config, OptimizerConfig::Adam { lr: 0.001 });

        let config: OptimizerConfig = serde_yaml::from_str("type: adamw\nargs:\n  lr: 0.01\n")?;
        assert_eq!(config.lr(), 0.01);
        assert!(matches!(config, OptimizerConfig::AdamW { .. }));
        Ok(())
    }

    #[test]
    fn test_invalid_learning_rate() {
        assert!(OptimizerBuilder::new(Some(OptimizerConfig::Sgd { lr: 0.0 })).is_err());
    }

    #[test]
    fn test_sgd_step() -> Result<()> {
        // Minimizes (x - 3)^2 from x = 0 with a single step: x <- x - lr * 2 * (x - 3).
        let x = Var::zeros(1, DType::F32, &Device::Cpu)?;
        let builder = OptimizerBuilder::new(Some(OptimizerConfig::Sgd { lr: 0.25 }))?;
        let mut opt = builder.build(vec![x.clone()])?;
        assert_eq!(opt.learning_rate(), 0.25);

        let loss = (x.as_tensor() - 3.0)?.sqr()?.sum_all()?;
        opt.backward_step(&loss)?;
        let v = x.as_tensor().to_vec1::<f32>()?;
        assert!((v[0] - 1.5).abs() < 1e-6);

        opt.set_learning_rate(0.1);
        assert_eq!(opt.learning_rate(), 0.1);
        Ok(())
    }

    #[test]
    fn test_adam_reduces_loss() -> Result<()> {
        let x = Var::zeros(2, DType::F32, &Device::Cpu)?;
        let mut opt = OptimizerConfig::Adam { lr: 0.1 }.build(vec![x.clone()])?;
        let loss_fn = |x: &Var| -> Result<f32> {
            Ok((x.as_tensor() - 1.0)?.sqr()?.sum_all()?.to_scalar::<f32>()?)
        };
        let before = loss_fn(&x)?;
        for _ in 0..10 {
            let loss = (x.as_tensor() - 1.0)?.sqr()?.sum_all()?;
            opt.backward_step(&loss)?;
        }
        assert!(loss_fn(&x)? < before);
        Ok(())
    }
}
