//! Configuration of [`Agent`](super::Agent).
use crate::error::PixelqError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Agent`](super::Agent).
///
/// Defaults follow the common frame-based Q-learning setup: a 100k-entry
/// memory seeded by 500 random transitions, four stacked frames, actions
/// held for four ticks, exploration annealed from 1.0 to 0.1 over a million
/// decisions, rewards clipped into `[-1, 1]`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AgentConfig {
    /// Maximum number of transitions held in replay memory.
    pub replay_capacity: usize,

    /// Number of stored transitions below which the agent is in burn-in:
    /// forced random actions, no training, no checkpoints.
    pub replay_start_size: usize,

    /// Number of preprocessed frames stacked into one state.
    pub frame_stack_depth: usize,

    /// Number of consecutive ticks a chosen action is held. Rewards from
    /// held ticks accumulate into the decision's transition.
    pub action_repeat: usize,

    /// Interval of training updates, in ticks.
    pub update_frequency: usize,

    /// Interval of checkpoints, in ticks.
    pub save_frequency: usize,

    /// Discount applied to the bootstrapped future value, in `(0, 1)`.
    pub discount: f64,

    /// Initial probability of a random action.
    pub exploration_start_rate: f64,

    /// Final probability of a random action.
    pub exploration_end_rate: f64,

    /// Post-burn-in decisions over which exploration anneals to its floor.
    pub exploration_anneal_span: usize,

    /// Transitions per training batch.
    pub batch_size: usize,

    /// Optional `(min, max)` clamp applied to each raw reward before it is
    /// accumulated and stored.
    pub reward_clip_range: Option<(f32, f32)>,

    /// Seed for the replay sampling RNG.
    pub seed: u64,

    /// Directory checkpoints are written to. `None` disables the cadence;
    /// explicit saves remain available.
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            replay_capacity: 100_000,
            replay_start_size: 500,
            frame_stack_depth: 4,
            action_repeat: 4,
            update_frequency: 4,
            save_frequency: 10_000,
            discount: 0.99,
            exploration_start_rate: 1.0,
            exploration_end_rate: 0.1,
            exploration_anneal_span: 1_000_000,
            batch_size: 32,
            reward_clip_range: Some((-1.0, 1.0)),
            seed: 42,
            checkpoint_dir: None,
        }
    }
}

impl AgentConfig {
    /// Sets the replay memory capacity.
    pub fn replay_capacity(mut self, v: usize) -> Self {
        self.replay_capacity = v;
        self
    }

    /// Sets the burn-in threshold.
    pub fn replay_start_size(mut self, v: usize) -> Self {
        self.replay_start_size = v;
        self
    }

    /// Sets the number of stacked frames per state.
    pub fn frame_stack_depth(mut self, v: usize) -> Self {
        self.frame_stack_depth = v;
        self
    }

    /// Sets the action repeat.
    pub fn action_repeat(mut self, v: usize) -> Self {
        self.action_repeat = v;
        self
    }

    /// Sets the training interval in ticks.
    pub fn update_frequency(mut self, v: usize) -> Self {
        self.update_frequency = v;
        self
    }

    /// Sets the checkpoint interval in ticks.
    pub fn save_frequency(mut self, v: usize) -> Self {
        self.save_frequency = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount(mut self, v: f64) -> Self {
        self.discount = v;
        self
    }

    /// Sets the initial exploration rate.
    pub fn exploration_start_rate(mut self, v: f64) -> Self {
        self.exploration_start_rate = v;
        self
    }

    /// Sets the final exploration rate.
    pub fn exploration_end_rate(mut self, v: f64) -> Self {
        self.exploration_end_rate = v;
        self
    }

    /// Sets the annealing span in post-burn-in decisions.
    pub fn exploration_anneal_span(mut self, v: usize) -> Self {
        self.exploration_anneal_span = v;
        self
    }

    /// Sets the training batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the reward clamp.
    pub fn reward_clip_range(mut self, v: Option<(f32, f32)>) -> Self {
        self.reward_clip_range = v;
        self
    }

    /// Sets the sampling seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the checkpoint directory.
    pub fn checkpoint_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(v.into());
        self
    }

    /// Rejects configurations the agent cannot run with.
    ///
    /// Called at agent construction; `step` assumes a validated config.
    pub fn validate(&self) -> Result<(), PixelqError> {
        fn positive(name: &str, v: usize) -> Result<(), PixelqError> {
            if v == 0 {
                Err(PixelqError::InvalidConfig(format!(
                    "{} must be positive",
                    name
                )))
            } else {
                Ok(())
            }
        }

        positive("replay_capacity", self.replay_capacity)?;
        positive("frame_stack_depth", self.frame_stack_depth)?;
        positive("action_repeat", self.action_repeat)?;
        positive("update_frequency", self.update_frequency)?;
        positive("save_frequency", self.save_frequency)?;
        positive("batch_size", self.batch_size)?;
        positive("exploration_anneal_span", self.exploration_anneal_span)?;

        if self.batch_size > self.replay_capacity {
            return Err(PixelqError::InvalidConfig(format!(
                "batch_size {} exceeds replay_capacity {}",
                self.batch_size, self.replay_capacity
            )));
        }
        if self.replay_start_size > self.replay_capacity {
            return Err(PixelqError::InvalidConfig(format!(
                "replay_start_size {} exceeds replay_capacity {}",
                self.replay_start_size, self.replay_capacity
            )));
        }
        if !(self.discount > 0.0 && self.discount < 1.0) {
            return Err(PixelqError::InvalidConfig(format!(
                "discount {} is outside (0, 1)",
                self.discount
            )));
        }

        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.exploration_start_rate) || !in_unit(self.exploration_end_rate) {
            return Err(PixelqError::InvalidConfig(
                "exploration rates must lie in [0, 1]".into(),
            ));
        }
        if self.exploration_end_rate > self.exploration_start_rate {
            return Err(PixelqError::InvalidConfig(
                "exploration_end_rate exceeds exploration_start_rate".into(),
            ));
        }

        if let Some((lo, hi)) = self.reward_clip_range {
            if lo > hi {
                return Err(PixelqError::InvalidConfig(format!(
                    "reward_clip_range ({}, {}) is inverted",
                    lo, hi
                )));
            }
        }

        Ok(())
    }

    /// Constructs [`AgentConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(config)
    }

    /// Saves [`AgentConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
