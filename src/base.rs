//! Collaborator traits of the agent core.
mod env;
mod q_function;

pub use env::{Env, EventSink, FeedbackAccumulator, Observation, RawFrame};
pub use q_function::QFunction;
