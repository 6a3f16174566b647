use anyhow::Result;
use clap::Parser;
use log::info;
use lwrl::{config::ExperimentConfig, env::make_env};
use lwrl_candle_agent::{dqn::Dqn, mlp::Mlp};
use lwrl_core::{Env, Model, Runner};

/// Train a DQN agent on an environment, or test a saved one.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Environment id, e.g. CartPole-v1.
    #[arg(long)]
    env_id: String,

    /// YAML file of the model, agent and runner.
    #[arg(long)]
    agent: String,

    /// YAML file of the action-value network.
    #[arg(long)]
    network: String,

    /// Directory of checkpoints.
    #[arg(long)]
    save_dir: Option<String>,

    /// Train the agent. The latest checkpoint is tested otherwise.
    #[arg(long, default_value_t = false)]
    is_train: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ExperimentConfig::load(&args.agent, &args.network)?;
    if let Some(save_dir) = &args.save_dir {
        config = config.save_dir(save_dir);
    }

    let mut env = make_env(&args.env_id, config.runner.seed)?;
    let mut model: Model<Dqn<Mlp>> = Model::build(
        config.model,
        env.state_spec(),
        env.action_spec(),
        config.dqn,
    )?;
    let runner = Runner::build(config.runner)?;

    if args.is_train {
        let summary = runner.train(&mut env, &mut model)?;
        info!("Finished training on {}: {}", args.env_id, summary);
    } else {
        let step = model.restore()?;
        info!("Testing the checkpoint at step {}", step);
        let returns = runner.test(&mut env, &mut model)?;
        let mean = returns.iter().sum::<f32>() / returns.len().max(1) as f32;
        info!("Mean return over {} episodes: {}", returns.len(), mean);
    }

    Ok(())
}
