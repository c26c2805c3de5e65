//! Deep Q-learning agent.
mod config;

use crate::{
    base::{QFunction, RawFrame},
    checkpoint::{self, AgentSnapshot, CheckpointScheduler},
    error::PixelqError,
    exploration::ExplorationScheduler,
    frame_stack::{FrameStacker, StackedState},
    replay::{ReplayMemory, Transition},
};
use anyhow::Result;
pub use config::AgentConfig;
use log::{debug, info, trace};
use std::path::{Path, PathBuf};

/// Converts a stream of `(frame, reward, terminal)` observations into
/// actions while learning a value function from replayed experience.
///
/// One [`step`](Agent::step) call per environment tick; the call is not
/// reentrant and the agent is owned by a single logical thread. Each tick
/// falls into one of four phases:
///
/// * **burn-in**: replay memory below `replay_start_size`; actions are
///   random, nothing is trained or saved;
/// * **repeating**: within an action-repeat window; the last decision's
///   action is reissued and the tick's reward accumulates into it;
/// * **deciding**: a real decision where the previous transition is closed,
///   a new state is built and a new open transition appended;
/// * **training**: on decision ticks at the update cadence, a sampled
///   batch is pushed through the approximator.
///
/// The reward and resulting state of an action arrive one tick after the
/// action is taken, so transitions are recorded in two phases: opened when
/// the action is chosen, closed on the next decision once the outcome is
/// known. Exactly one transition is open at any time.
pub struct Agent<Q: QFunction> {
    q: Q,
    memory: ReplayMemory,
    stacker: FrameStacker,
    exploration: ExplorationScheduler,
    checkpoints: CheckpointScheduler,
    checkpoint_dir: Option<PathBuf>,

    n_actions: usize,
    action_repeat: usize,
    update_frequency: usize,
    batch_size: usize,
    replay_start_size: usize,
    discount: f32,
    reward_clip_range: Option<(f32, f32)>,

    iteration: usize,
    pending_reward: f32,
    pending_terminal: bool,
    last_action: usize,

    episode_return: f32,
    episodes: usize,

    config: AgentConfig,
}

impl<Q: QFunction> Agent<Q> {
    /// Constructs an agent for an environment with `n_actions` discrete
    /// actions.
    ///
    /// The configuration is validated here; a rejected configuration never
    /// reaches `step`.
    pub fn build(config: AgentConfig, q: Q, n_actions: usize) -> Result<Self> {
        config.validate()?;
        if n_actions == 0 {
            return Err(PixelqError::InvalidConfig("n_actions must be positive".into()).into());
        }

        Ok(Self {
            q,
            memory: ReplayMemory::new(config.replay_capacity, config.seed),
            stacker: FrameStacker::new(config.frame_stack_depth),
            exploration: ExplorationScheduler::new(
                config.exploration_start_rate,
                config.exploration_end_rate,
                config.exploration_anneal_span,
            ),
            checkpoints: CheckpointScheduler::new(config.save_frequency),
            checkpoint_dir: config.checkpoint_dir.clone(),
            n_actions,
            action_repeat: config.action_repeat,
            update_frequency: config.update_frequency,
            batch_size: config.batch_size,
            replay_start_size: config.replay_start_size,
            discount: config.discount as f32,
            reward_clip_range: config.reward_clip_range,
            iteration: 0,
            pending_reward: 0.0,
            pending_terminal: false,
            last_action: 0,
            episode_return: 0.0,
            episodes: 0,
            config,
        })
    }

    /// Reconstructs an agent from a checkpoint directory.
    ///
    /// The approximator parameters and the agent-level scalars (iteration,
    /// exploration schedule) come back exactly as saved. The replay memory
    /// does not survive a restore: the agent starts with empty memory and
    /// re-enters burn-in to reseed it.
    pub fn restore(
        config: AgentConfig,
        mut q: Q,
        n_actions: usize,
        dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let snapshot = checkpoint::load_checkpoint(dir.as_ref(), &mut q)?;
        let mut agent = Self::build(config, q, n_actions)?;
        agent.iteration = snapshot.iteration;
        agent.exploration = ExplorationScheduler::with_steps(
            agent.config.exploration_start_rate,
            agent.config.exploration_end_rate,
            agent.config.exploration_anneal_span,
            snapshot.exploration_steps,
        );
        Ok(agent)
    }

    /// Environment ticks processed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current probability of a random action.
    pub fn exploration_rate(&self) -> f64 {
        self.exploration.rate()
    }

    /// True while replay memory is still being seeded with random play.
    pub fn is_burning_in(&self) -> bool {
        self.memory.len() < self.replay_start_size
    }

    /// Read-only view of the replay memory, for inspection.
    pub fn replay_memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// The value-function approximator.
    pub fn q_function(&self) -> &Q {
        &self.q
    }

    /// Episodes finished so far.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Persists the approximator parameters and agent scalars into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        checkpoint::save_checkpoint(dir.as_ref(), &self.snapshot(), &self.q)
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            iteration: self.iteration,
            exploration_rate: self.exploration.rate(),
            exploration_steps: self.exploration.steps(),
        }
    }

    fn clip(&self, reward: f32) -> f32 {
        match self.reward_clip_range {
            Some((lo, hi)) => reward.max(lo).min(hi),
            None => reward,
        }
    }

    /// Consumes one observation and returns the action for this tick.
    ///
    /// `reward` and `terminal` are consequences of the previously returned
    /// action. An error from the approximator or a protocol violation is
    /// fatal; the caller halts the episode rather than continue against a
    /// corrupt learner.
    pub fn step(&mut self, frame: &RawFrame, reward: f32, terminal: bool) -> Result<usize> {
        let tick = self.iteration;
        self.iteration += 1;

        self.track_episode(reward, terminal);

        // Clipping is per tick, before accumulation across a repeat window.
        let clipped = self.clip(reward);

        if tick % self.action_repeat != 0 {
            self.pending_reward += clipped;
            self.pending_terminal |= terminal;
            return Ok(self.last_action);
        }

        let reward = self.pending_reward + clipped;
        let terminal = self.pending_terminal || terminal;
        self.pending_reward = 0.0;
        self.pending_terminal = false;

        // An episode boundary severs frame history: the state built from
        // this frame must not carry anything from before the terminal.
        if terminal {
            self.stacker.reset();
        }
        let state = self.stacker.push(FrameStacker::preprocess(frame)?);

        if !self.memory.is_empty() {
            self.memory.close_last(reward, state.clone(), terminal)?;
        }

        let burn_in = self.is_burning_in();

        if self.checkpoints.is_due(tick, burn_in) {
            if let Some(dir) = self.checkpoint_dir.clone() {
                checkpoint::save_checkpoint(&dir, &self.snapshot(), &self.q)?;
            }
        }

        if !burn_in && tick % self.update_frequency == 0 {
            self.train_once()?;
        }

        let action = self.select_action(&state, burn_in)?;
        self.memory.append(Transition::open(state, action));
        self.last_action = action;
        Ok(action)
    }

    fn track_episode(&mut self, reward: f32, terminal: bool) {
        self.episode_return += reward;
        if terminal {
            self.episodes += 1;
            info!(
                "Episode {} finished with return {}",
                self.episodes, self.episode_return
            );
            self.episode_return = 0.0;
        }
    }

    /// Assembles one batch and pushes it through the approximator.
    ///
    /// Targets are recomputed at every sampling; the approximator's
    /// estimates move between updates, so a cached target would be stale.
    fn train_once(&mut self) -> Result<()> {
        let batch = match self.memory.sample(self.batch_size) {
            Ok(batch) => batch,
            Err(PixelqError::InsufficientData {
                requested,
                available,
            }) => {
                debug!(
                    "Skipped update: {} closed transitions for a batch of {}",
                    available, requested
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut states = Vec::with_capacity(batch.len());
        let mut actions = Vec::with_capacity(batch.len());
        let mut targets = Vec::with_capacity(batch.len());

        for t in batch {
            let reward = t.reward.expect("sampled transitions are closed");
            let target = if t.terminal {
                reward
            } else {
                let state_out = t.state_out.as_ref().expect("sampled transitions are closed");
                let q = self.q.compute_q(state_out)?;
                let best = q.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                reward + self.discount * best
            };
            states.push(t.state_in.clone());
            actions.push(t.action);
            targets.push(target);
        }

        let loss = self.q.update(&states, &actions, &targets)?;
        trace!("loss = {}", loss);
        Ok(())
    }

    /// Epsilon-greedy action selection; ties go to the first index so the
    /// greedy choice is deterministic.
    fn select_action(&mut self, state: &StackedState, burn_in: bool) -> Result<usize> {
        if self.exploration.should_explore(burn_in) {
            return Ok(fastrand::usize(..self.n_actions));
        }

        let q = self.q.compute_q(state)?;
        let mut best = 0;
        for (i, v) in q.iter().enumerate() {
            if *v > q[best] {
                best = i;
            }
        }
        Ok(best)
    }
}
