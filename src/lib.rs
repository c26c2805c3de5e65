#![warn(missing_docs)]
//! A deep Q-learning agent core for frame-based environments.
//!
//! The crate owns the agent loop: it turns a stream of
//! `(frame, reward, terminal)` observations into a bounded replay memory of
//! well-formed transitions, decides actions under an annealed
//! epsilon-greedy policy with action repeat, trains a value-function
//! approximator from sampled batches at a fixed cadence, and checkpoints
//! progress without corrupting the learning schedule.
//!
//! The value function ([`QFunction`]) and the game ([`Env`]) are
//! trait-level collaborators; the agent never looks inside either.
//! [`dummy`] ships scripted implementations of both for tests and
//! experimentation, and [`Runner`] drives the full loop.
pub mod dummy;
pub mod error;

mod base;
pub use base::{Env, EventSink, FeedbackAccumulator, Observation, QFunction, RawFrame};

mod frame_stack;
pub use frame_stack::{Frame, FrameStacker, StackedState, FRAME_SIDE};

mod replay;
pub use replay::{ReplayMemory, Transition};

mod exploration;
pub use exploration::ExplorationScheduler;

pub mod checkpoint;
pub use checkpoint::{AgentSnapshot, CheckpointScheduler};

mod agent;
pub use agent::{Agent, AgentConfig};

mod runner;
pub use runner::{Runner, RunSummary};
