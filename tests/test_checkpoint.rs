use anyhow::Result;
use pixelq::checkpoint;
use pixelq::dummy::DummyQFunction;
use pixelq::error::PixelqError;
use pixelq::{Agent, AgentConfig, RawFrame};
use tempdir::TempDir;

fn frame(v: u8) -> RawFrame {
    RawFrame::gray(4, 4, vec![v; 16])
}

fn config() -> AgentConfig {
    AgentConfig::default()
        .replay_capacity(32)
        .replay_start_size(1)
        .frame_stack_depth(2)
        .action_repeat(1)
        .update_frequency(4)
        .batch_size(1)
        .exploration_anneal_span(10)
}

#[test]
fn round_trip_restores_iteration_and_exploration_exactly() -> Result<()> {
    let dir = TempDir::new("pixelq_checkpoint")?;

    let mut agent = Agent::build(config(), DummyQFunction::new(vec![1.0, 2.0]), 2)?;
    for tick in 0..7u8 {
        agent.step(&frame(tick), 0.1, false)?;
    }
    let iteration = agent.iteration();
    let rate = agent.exploration_rate();
    assert!(rate < 1.0);

    agent.save(dir.path())?;

    let restored = Agent::restore(config(), DummyQFunction::new(vec![0.0, 0.0]), 2, dir.path())?;
    assert_eq!(restored.iteration(), iteration);
    assert_eq!(restored.exploration_rate(), rate);

    // The approximator blob came back too.
    assert_eq!(restored.q_function().scores(), &[1.0, 2.0]);

    // Replay memory does not survive a restore: the agent reseeds it.
    assert_eq!(restored.replay_memory().len(), 0);
    assert!(restored.is_burning_in());
    Ok(())
}

#[test]
fn restoring_from_a_missing_path_is_an_error() {
    let dir = TempDir::new("pixelq_checkpoint").unwrap();
    let missing = dir.path().join("nowhere");

    let err = Agent::restore(config(), DummyQFunction::new(vec![0.0]), 1, &missing)
        .err()
        .expect("restore must fail");
    assert!(matches!(
        err.downcast_ref::<PixelqError>(),
        Some(PixelqError::CheckpointNotFound(_))
    ));
}

#[test]
fn cadence_saves_once_past_burn_in() -> Result<()> {
    let dir = TempDir::new("pixelq_checkpoint")?;

    let config = config()
        .save_frequency(4)
        .checkpoint_dir(dir.path().join("agent"));
    let mut agent = Agent::build(config, DummyQFunction::new(vec![0.0]), 1)?;

    // Tick 0 is on the cadence but still in burn-in; nothing is written.
    agent.step(&frame(0), 0.0, false)?;
    assert!(!dir.path().join("agent").exists());

    for tick in 1..5u8 {
        agent.step(&frame(tick), 0.0, false)?;
    }

    // Tick 4 was due and past burn-in.
    let mut q = DummyQFunction::new(vec![0.0]);
    let snapshot = checkpoint::load_checkpoint(&dir.path().join("agent"), &mut q)?;
    assert_eq!(snapshot.iteration, 5);
    Ok(())
}

#[test]
fn config_round_trips_through_yaml() -> Result<()> {
    let dir = TempDir::new("pixelq_config")?;
    let path = dir.path().join("agent.yaml");

    let config = config().seed(7).discount(0.95);
    config.save(&path)?;
    let loaded = AgentConfig::load(&path)?;
    assert_eq!(config, loaded);
    Ok(())
}

#[test]
fn construction_rejects_bad_configurations() {
    for config in vec![
        config().batch_size(64).replay_capacity(32),
        config().replay_start_size(64).replay_capacity(32),
        config().exploration_anneal_span(0),
        config().discount(1.0),
        config().exploration_end_rate(0.5).exploration_start_rate(0.1),
        config().reward_clip_range(Some((1.0, -1.0))),
        config().action_repeat(0),
    ] {
        let err = Agent::build(config, DummyQFunction::new(vec![0.0]), 1)
            .err()
            .expect("validation must reject");
        assert!(matches!(
            err.downcast_ref::<PixelqError>(),
            Some(PixelqError::InvalidConfig(_))
        ));
    }
}
