use anyhow::Result;
use lwrl::{config::ExperimentConfig, env::make_env};
use lwrl_candle_agent::{dqn::Dqn, mlp::Mlp};
use lwrl_core::{Env, Model, Runner};
use tempdir::TempDir;
use test_log::test;

const AGENT: &str = r#"
model:
  exploration_schedule:
    type: linear
    args:
      initial_value: 1.0
      final_value: 0.1
      schedule_steps: 100
  optimizer:
    type: adam
    args:
      lr: 0.001
dqn:
  target_update_interval: 10
runner:
  max_timesteps: 120
  warmup_period: 40
  update_interval: 2
  batch_size: 16
  replay_capacity: 200
  save_interval: 20
  log_interval: 50
  test_episodes: 2
"#;

fn build(config: &ExperimentConfig) -> Result<(impl Env, Model<Dqn<Mlp>>)> {
    let env = make_env("CartPole-v1", config.runner.seed)?;
    let model = Model::build(
        config.model.clone(),
        env.state_spec(),
        env.action_spec(),
        config.dqn.clone(),
    )?;
    Ok((env, model))
}

#[test]
fn test_train_save_and_test() -> Result<()> {
    let dir = TempDir::new("lwrl_cartpole")?;
    let config = ExperimentConfig::from_yaml_strs(AGENT, "units: [16]\n")?.save_dir(dir.path());

    let (mut env, mut model) = build(&config)?;
    let runner = Runner::build(config.runner.clone())?;
    runner.train(&mut env, &mut model)?;
    assert_eq!(model.timestep(), 120);
    // Updates at t = 42, 44, ..., 120.
    assert_eq!(model.num_updates(), 40);

    let store = model.store().unwrap();
    assert_eq!(store.latest_step()?, Some(120));

    let (mut env, mut restored) = build(&config)?;
    assert_eq!(restored.restore()?, 120);
    assert_eq!(restored.counters(), model.counters());

    let returns = runner.test(&mut env, &mut restored)?;
    assert_eq!(returns.len(), 2);
    assert!(returns.iter().all(|r| *r >= 1.0));
    assert_eq!(restored.timestep(), 120);
    Ok(())
}

#[test]
fn test_unknown_env() {
    let err = make_env("MountainCar-v0", 0).err().unwrap();
    assert!(err.to_string().contains("MountainCar-v0"));
}
