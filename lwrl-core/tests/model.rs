use anyhow::Result;
use lwrl_core::{
    checkpoint::SaverConfig,
    dummy::{DummyAlgorithm, DummyConfig},
    error::LwrlError,
    schedule::ScheduleConfig,
    Action, ActionSpec, Model, ModelConfig, StateSpec, TransitionBatch,
};
use ndarray::{arr1, ArrayD};
use tempdir::TempDir;
use test_log::test;

fn obs() -> ArrayD<f32> {
    arr1(&[0.5f32, -0.5, 1.0, 0.0]).into_dyn()
}

fn build(
    config: ModelConfig,
    action_spec: ActionSpec,
    algo: DummyConfig,
) -> Result<Model<DummyAlgorithm>> {
    Model::build(config, StateSpec::new(vec![4]), action_spec, algo)
}

fn batch(n: usize) -> TransitionBatch {
    let mut batch = TransitionBatch::with_capacity(n);
    for _ in 0..n {
        batch.push(obs(), Action::Discrete(0), obs(), 1.0, false);
    }
    batch
}

fn observe_n(model: &mut Model<DummyAlgorithm>, n: usize) -> Result<()> {
    for _ in 0..n {
        model.observe(&obs(), &Action::Discrete(0), 0.0, false)?;
    }
    Ok(())
}

#[test]
fn act_without_exploration_is_deterministic() -> Result<()> {
    let config = ModelConfig::default().exploration_schedule(ScheduleConfig::constant(1.0));
    let mut model = build(config, ActionSpec::discrete(4), DummyConfig::new(Action::Discrete(2)))?;
    for _ in 0..100 {
        let (act, _) = model.act(&obs(), false)?;
        assert_eq!(act, Action::Discrete(2));
    }
    Ok(())
}

#[test]
fn full_exploration_is_uniform() -> Result<()> {
    let config = ModelConfig::default().exploration_schedule(ScheduleConfig::constant(1.0));
    let mut model = build(config, ActionSpec::discrete(4), DummyConfig::new(Action::Discrete(0)))?;

    let n = 8000;
    let mut counts = [0usize; 4];
    for _ in 0..n {
        let (act, _) = model.act(&obs(), true)?;
        counts[act.as_discrete().unwrap()] += 1;
    }
    // Expected 2000 per action; 5 standard deviations is about 194.
    for c in counts.iter() {
        assert!((*c as i64 - 2000).abs() < 200, "counts: {:?}", counts);
    }
    Ok(())
}

#[test]
fn exploration_is_reproducible_with_seed() -> Result<()> {
    let run = || -> Result<Vec<Action>> {
        let config = ModelConfig::default()
            .exploration_schedule(ScheduleConfig::constant(0.5))
            .seed(3);
        let mut model =
            build(config, ActionSpec::discrete(4), DummyConfig::new(Action::Discrete(0)))?;
        let mut actions = vec![];
        for _ in 0..50 {
            actions.push(model.act(&obs(), true)?.0);
        }
        Ok(actions)
    };
    assert_eq!(run()?, run()?);
    Ok(())
}

#[test]
fn linear_decay_scenario() -> Result<()> {
    let config =
        ModelConfig::default().exploration_schedule(ScheduleConfig::linear(1.0, 0.0, 1000));
    let mut model = build(config, ActionSpec::discrete(4), DummyConfig::new(Action::Discrete(3)))?;

    // step 0: every action is random
    let mut seen = [false; 4];
    for _ in 0..200 {
        let (act, t) = model.act(&obs(), true)?;
        assert_eq!(t, 0);
        seen[act.as_discrete().unwrap()] = true;
    }
    assert!(seen.iter().all(|s| *s));

    // step 1000: the algorithm's decision only
    observe_n(&mut model, 1000)?;
    assert_eq!(model.exploration_value(), Some(0.0));
    for _ in 0..200 {
        let (act, t) = model.act(&obs(), true)?;
        assert_eq!(t, 1000);
        assert_eq!(act, Action::Discrete(3));
    }
    Ok(())
}

#[test]
fn continuous_clamp_scenario() -> Result<()> {
    let config = ModelConfig::default().exploration_schedule(ScheduleConfig::constant(0.5));
    let mut model = build(
        config,
        ActionSpec::continuous(-1.0, 1.0),
        DummyConfig::new(Action::Continuous(vec![0.9])),
    )?;
    let (act, _) = model.act(&obs(), true)?;
    assert_eq!(act, Action::Continuous(vec![1.0]));

    let (act, _) = model.act(&obs(), false)?;
    assert_eq!(act, Action::Continuous(vec![0.9]));
    Ok(())
}

#[test]
fn continuous_actions_stay_in_bounds() -> Result<()> {
    for value in [-3.0, -0.7, 0.0, 0.2, 5.0].iter() {
        for decision in [-1.0f32, -0.3, 0.0, 0.8, 1.0].iter() {
            let config =
                ModelConfig::default().exploration_schedule(ScheduleConfig::constant(*value));
            let mut model = build(
                config,
                ActionSpec::continuous(-1.0, 1.0),
                DummyConfig::new(Action::Continuous(vec![*decision])),
            )?;
            let (act, _) = model.act(&obs(), true)?;
            let x = act.as_continuous().unwrap()[0];
            assert!((-1.0..=1.0).contains(&x), "{} + {} -> {}", decision, value, x);
        }
    }
    Ok(())
}

#[test]
fn counters_are_monotonic() -> Result<()> {
    let mut model = build(
        ModelConfig::default(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    for k in 1..=10u64 {
        model.observe(&obs(), &Action::Discrete(0), 1.0, k % 3 == 0)?;
        assert_eq!(model.timestep(), k);
    }
    for k in 1..=3u64 {
        let record = model.update(&batch(8))?;
        assert_eq!(record.get_scalar("batch_size")?, 8.0);
        assert_eq!(model.num_updates(), k);
    }
    assert_eq!(model.algorithm().last_discount_factor(), Some(0.99));
    Ok(())
}

#[test]
fn empty_batch_keeps_num_updates() -> Result<()> {
    let mut model = build(
        ModelConfig::default(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    model.update(&batch(2))?;
    let err = model.update(&TransitionBatch::default()).unwrap_err();
    assert!(matches!(err.downcast_ref::<LwrlError>(), Some(LwrlError::EmptyBatch)));
    assert_eq!(model.num_updates(), 1);
    assert_eq!(model.algorithm().weight()?, 1.0);
    Ok(())
}

#[test]
fn inconsistent_batch_is_rejected() -> Result<()> {
    let mut model = build(
        ModelConfig::default(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    let mut b = batch(3);
    b.reward.pop();
    let err = model.update(&b).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LwrlError>(),
        Some(LwrlError::InconsistentBatch(_))
    ));
    assert_eq!(model.num_updates(), 0);
    Ok(())
}

#[test]
fn failed_learn_keeps_num_updates() -> Result<()> {
    let mut model = build(
        ModelConfig::default(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)).fail_learn(true),
    )?;
    let err = model.update(&batch(2)).unwrap_err();
    assert_eq!(err.to_string(), "learn failed");
    assert_eq!(model.num_updates(), 0);
    Ok(())
}

#[test]
fn without_saver_spec() -> Result<()> {
    let mut model = build(
        ModelConfig::default(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    observe_n(&mut model, 3)?;
    model.save(10)?;
    assert!(model.store().is_none());
    assert_eq!(model.timestep(), 3);

    let err = model.restore().unwrap_err();
    assert!(matches!(err.downcast_ref::<LwrlError>(), Some(LwrlError::NotConfigured)));
    assert_eq!(model.timestep(), 3);
    Ok(())
}

#[test]
fn restore_from_empty_store() -> Result<()> {
    let dir = TempDir::new("empty_store")?;
    let config = ModelConfig::default().saver_spec(SaverConfig::new(dir.path().join("model")));
    let mut model = build(config, ActionSpec::discrete(2), DummyConfig::new(Action::Discrete(0)))?;
    let err = model.restore().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LwrlError>(),
        Some(LwrlError::NoCheckpointFound(_))
    ));
    assert_eq!(model.timestep(), 0);
    Ok(())
}

#[test]
fn save_and_restore_into_fresh_model() -> Result<()> {
    let dir = TempDir::new("round_trip")?;
    let config = ModelConfig::default().saver_spec(SaverConfig::new(dir.path()));

    let mut model = build(
        config.clone(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    observe_n(&mut model, 37)?;
    model.update(&batch(4))?;
    model.update(&batch(4))?;
    model.algorithm().set_weight(-1.25)?;
    model.save(20)?;

    // Later state is not what gets restored.
    observe_n(&mut model, 5)?;
    model.save(10)?;

    let mut fresh = build(config, ActionSpec::discrete(2), DummyConfig::new(Action::Discrete(0)))?;
    assert_eq!(fresh.algorithm().weight()?, 0.0);
    let step = fresh.restore()?;
    assert_eq!(step, 20);
    assert_eq!(fresh.algorithm().weight()?, -1.25);
    assert_eq!(fresh.timestep(), 37);
    assert_eq!(fresh.num_updates(), 2);
    assert_eq!(fresh.algorithm().n_restored(), 1);

    fresh.restore_step(10)?;
    assert_eq!(fresh.timestep(), 42);
    Ok(())
}

#[test]
fn failed_restore_changes_nothing() -> Result<()> {
    let dir = TempDir::new("broken_store")?;
    let config = ModelConfig::default().saver_spec(SaverConfig::new(dir.path()));

    let mut model = build(
        config.clone(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    observe_n(&mut model, 3)?;
    model.algorithm().set_weight(7.0)?;
    model.save(5)?;
    std::fs::write(dir.path().join("5").join("counters.yaml"), "timestep: [")?;

    let mut fresh = build(config, ActionSpec::discrete(2), DummyConfig::new(Action::Discrete(0)))?;
    assert!(fresh.restore().is_err());
    assert_eq!(fresh.algorithm().weight()?, 0.0);
    assert_eq!(fresh.timestep(), 0);
    assert_eq!(fresh.algorithm().n_restored(), 0);
    Ok(())
}

#[test]
fn non_finite_bounds_are_rejected() {
    let spec = ActionSpec::Continuous {
        dim: 1,
        min_value: Some(f32::NAN),
        max_value: Some(1.0),
    };
    let err = build(
        ModelConfig::default().exploration_schedule(ScheduleConfig::constant(0.5)),
        spec,
        DummyConfig::new(Action::Continuous(vec![0.0])),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err.downcast_ref::<LwrlError>(),
        Some(LwrlError::InvalidActionSpec(_))
    ));
}

#[test]
fn non_finite_schedule_is_rejected() {
    let err = build(
        ModelConfig::default().exploration_schedule(ScheduleConfig::constant(f64::NAN)),
        ActionSpec::continuous(-1.0, 1.0),
        DummyConfig::new(Action::Continuous(vec![0.9])),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err.downcast_ref::<LwrlError>(),
        Some(LwrlError::InvalidConfig(_))
    ));
}

#[test]
fn empty_pipeline_is_identity() -> Result<()> {
    let mut model = build(
        ModelConfig::default(),
        ActionSpec::discrete(2),
        DummyConfig::new(Action::Discrete(0)),
    )?;
    for x in [obs(), arr1(&[f32::MAX, f32::MIN, -0.0, 1e-30]).into_dyn()].iter() {
        assert_eq!(&model.preprocess(x)?, x);
    }
    Ok(())
}
