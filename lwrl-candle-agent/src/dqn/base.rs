//! DQN agent implemented with candle.
use super::DqnConfig;
use crate::{
    model::{IoDim, SubModel},
    util::{arrays_to_tensor, smooth_l1_loss, track, CriticLoss},
};
use anyhow::Result;
use candle_core::{shape::D, DType, Device, Tensor};
use candle_nn::{loss::mse, VarBuilder, VarMap};
use log::{debug, info};
use lwrl_core::{
    error::LwrlError,
    opt::Optimizer,
    record::{Record, RecordValue},
    Action, ActionSpec, Algorithm, LearnContext, Setup, TransitionBatch,
};
use ndarray::ArrayD;
use serde::{de::DeserializeOwned, Serialize};

/// DQN agent implemented with candle.
///
/// The action-value network `qnet` and the target network `qnet_tgt` live
/// in separate [`VarMap`]s. Only `qnet` is optimized and checkpointed; the
/// target network follows it every `target_update_interval` updates and is
/// synchronized after a restore.
pub struct Dqn<Q>
where
    Q: SubModel,
    Q::Config: DeserializeOwned + Serialize + IoDim + Clone,
{
    qnet: Q,
    qnet_varmap: VarMap,
    qnet_tgt: Q,
    qnet_tgt_varmap: VarMap,
    opt: Optimizer,
    in_dim: usize,
    n_actions: usize,
    target_update_interval: usize,
    tau: f64,
    double_dqn: bool,
    critic_loss: CriticLoss,
    device: Device,
    n_opts: usize,
}

impl<Q> Dqn<Q>
where
    Q: SubModel,
    Q::Config: DeserializeOwned + Serialize + IoDim + Clone,
{
    fn build_qnet(config: Q::Config, device: &Device) -> Result<(Q, VarMap)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let q = Q::build(vb, config)?;
        Ok((q, varmap))
    }

    /// Action values for a batch of preprocessed observations.
    pub fn q_values(&self, obs: &[ArrayD<f32>]) -> Result<Tensor> {
        let xs = arrays_to_tensor(obs, &self.device)?.reshape((obs.len(), self.in_dim))?;
        self.qnet.forward(&xs)
    }

    /// Number of updates performed.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Parameters of the target network.
    pub fn target_params(&self) -> &VarMap {
        &self.qnet_tgt_varmap
    }

    fn sync_target(&self, tau: f64) -> Result<()> {
        debug!("Update target network with tau = {}", tau);
        track(&self.qnet_tgt_varmap, &self.qnet_varmap, tau)
    }

    fn update_critic(&mut self, batch: &TransitionBatch, ctx: &LearnContext) -> Result<f32> {
        let n = batch.len();
        let obs = batch
            .obs
            .iter()
            .map(|o| ctx.preprocess(o))
            .collect::<Result<Vec<_>>>()?;
        let next_obs = batch
            .next_obs
            .iter()
            .map(|o| ctx.preprocess(o))
            .collect::<Result<Vec<_>>>()?;
        let obs = arrays_to_tensor(&obs, &self.device)?.reshape((n, self.in_dim))?;
        let next_obs = arrays_to_tensor(&next_obs, &self.device)?.reshape((n, self.in_dim))?;
        let act = {
            let act = batch
                .act
                .iter()
                .map(|a| match a.as_discrete() {
                    Some(ix) if ix < self.n_actions => Ok(ix as u32),
                    _ => Err(LwrlError::InvalidAction(format!("{:?} in batch", a))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Tensor::from_vec(act, (n, 1), &self.device)?
        };
        let reward = Tensor::from_slice(&batch.reward[..], (n,), &self.device)?;
        let is_not_done = {
            let is_not_done = batch
                .is_done
                .iter()
                .map(|v| (1 - v) as f32)
                .collect::<Vec<_>>();
            Tensor::from_vec(is_not_done, (n,), &self.device)?
        };

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let q = if self.double_dqn {
                let y = self.qnet.forward(&next_obs)?.argmax_keepdim(D::Minus1)?;
                let x = self.qnet_tgt.forward(&next_obs)?;
                x.gather(&y, D::Minus1)?.squeeze(D::Minus1)?
            } else {
                self.qnet_tgt.forward(&next_obs)?.max(D::Minus1)?
            };
            let discounted = ((is_not_done * ctx.discount_factor)? * q)?;
            (reward + discounted)?.detach()
        };

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };
        self.opt.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }
}

impl<Q> Algorithm for Dqn<Q>
where
    Q: SubModel,
    Q::Config: DeserializeOwned + Serialize + IoDim + Clone,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    ///
    /// Fails with [`LwrlError::InvalidActionSpec`] unless actions are discrete.
    fn build(config: Self::Config, setup: &Setup) -> Result<Self> {
        let n_actions = match setup.action_spec {
            ActionSpec::Discrete { num_actions } => *num_actions,
            spec => {
                return Err(LwrlError::InvalidActionSpec(format!(
                    "DQN needs discrete actions, got {:?}",
                    spec
                ))
                .into())
            }
        };
        if config.target_update_interval == 0 {
            return Err(LwrlError::InvalidConfig(
                "dqn: target_update_interval must be positive".to_string(),
            )
            .into());
        }
        let in_dim = setup.obs_shape.iter().product::<usize>();
        let device = config.device.build()?;
        let mut q_config = config.q_config;
        q_config.set_in_dim(in_dim);
        q_config.set_out_dim(n_actions);

        let (qnet, qnet_varmap) = Self::build_qnet(q_config.clone(), &device)?;
        let (qnet_tgt, qnet_tgt_varmap) = Self::build_qnet(q_config, &device)?;
        track(&qnet_tgt_varmap, &qnet_varmap, 1.0)?;
        let opt = setup.optimizer.build(qnet_varmap.all_vars())?;
        info!(
            "Built DQN: in_dim {}, {} actions, gamma {}",
            in_dim, n_actions, setup.discount_factor
        );

        Ok(Self {
            qnet,
            qnet_varmap,
            qnet_tgt,
            qnet_tgt_varmap,
            opt,
            in_dim,
            n_actions,
            target_update_interval: config.target_update_interval,
            tau: config.tau,
            double_dqn: config.double_dqn,
            critic_loss: config.critic_loss,
            device,
            n_opts: 0,
        })
    }

    /// Greedy action.
    fn decide(&self, obs: &ArrayD<f32>) -> Result<Action> {
        let q = self.q_values(std::slice::from_ref(obs))?;
        let ix = q.argmax(D::Minus1)?.to_vec1::<u32>()?[0];
        Ok(Action::Discrete(ix as usize))
    }

    fn learn(&mut self, batch: &TransitionBatch, ctx: &LearnContext) -> Result<Record> {
        let loss = self.update_critic(batch, ctx)?;

        self.n_opts += 1;
        if self.n_opts % self.target_update_interval == 0 {
            self.sync_target(self.tau)?;
        }

        Ok(Record::from_slice(&[("loss", RecordValue::Scalar(loss))]))
    }

    fn params(&self) -> &VarMap {
        &self.qnet_varmap
    }

    fn params_mut(&mut self) -> &mut VarMap {
        &mut self.qnet_varmap
    }

    fn on_restore(&mut self) -> Result<()> {
        self.sync_target(1.0)
    }
}
