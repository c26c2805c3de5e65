//! Checkpointing of agent progress.
//!
//! A checkpoint is one directory holding the approximator's opaque
//! parameter blob next to a small YAML record of the agent-level scalars.
//! Both are written in the same transaction so the learning schedule and
//! the network can never drift apart across a save/restore cycle.
//!
//! The replay memory is deliberately not part of a checkpoint: a restored
//! agent starts with empty memory and re-enters burn-in to reseed it.
use crate::base::QFunction;
use crate::error::PixelqError;
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};

/// File name of the agent-level record inside a checkpoint directory.
const SNAPSHOT_FILE: &str = "agent_state.yaml";

/// Agent-level scalar state persisted alongside the approximator blob.
///
/// `exploration_steps` is stored in addition to the rate so that restore
/// reconstructs the schedule exactly instead of re-deriving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Environment ticks processed so far.
    pub iteration: usize,

    /// Exploration rate at save time.
    pub exploration_rate: f64,

    /// Post-burn-in decisions taken by the exploration schedule.
    pub exploration_steps: usize,
}

/// Decides when agent progress is persisted.
#[derive(Debug, Clone)]
pub struct CheckpointScheduler {
    save_frequency: usize,
}

impl CheckpointScheduler {
    /// Constructs a scheduler saving every `save_frequency` ticks.
    pub fn new(save_frequency: usize) -> Self {
        Self { save_frequency }
    }

    /// True exactly on save-frequency boundaries outside of burn-in.
    ///
    /// Burn-in checkpoints are suppressed; a snapshot of an agent acting at
    /// random records nothing worth resuming from.
    pub fn is_due(&self, iteration: usize, burn_in: bool) -> bool {
        !burn_in && iteration % self.save_frequency == 0
    }
}

/// Writes the snapshot and approximator parameters into `dir`.
///
/// The record lands in a temporary file first and is renamed into place, so
/// a crash mid-write never publishes a partial record.
pub fn save_checkpoint<Q>(dir: &Path, snapshot: &AgentSnapshot, q: &Q) -> Result<()>
where
    Q: QFunction + ?Sized,
{
    fs::create_dir_all(dir)?;
    q.save(dir)?;

    let tmp = dir.join(format!("{}.tmp", SNAPSHOT_FILE));
    let mut file = File::create(&tmp)?;
    file.write_all(serde_yaml::to_string(snapshot)?.as_bytes())?;
    fs::rename(&tmp, dir.join(SNAPSHOT_FILE))?;

    info!(
        "Saved checkpoint at iteration {} in {:?}",
        snapshot.iteration, dir
    );
    Ok(())
}

/// Reads the snapshot back from `dir` and loads the approximator from it.
///
/// A missing record is [`PixelqError::CheckpointNotFound`]; there is no
/// silent fallback to a fresh agent.
pub fn load_checkpoint<Q>(dir: &Path, q: &mut Q) -> Result<AgentSnapshot>
where
    Q: QFunction + ?Sized,
{
    let path = dir.join(SNAPSHOT_FILE);
    if !path.is_file() {
        return Err(PixelqError::CheckpointNotFound(dir.to_path_buf()).into());
    }

    let file = File::open(&path)?;
    let snapshot: AgentSnapshot = serde_yaml::from_reader(BufReader::new(file))?;
    q.load(dir)?;

    info!(
        "Restored checkpoint at iteration {} from {:?}",
        snapshot.iteration, dir
    );
    Ok(snapshot)
}
