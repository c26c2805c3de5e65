//! Value-function approximator.
use crate::frame_stack::StackedState;
use anyhow::Result;
use std::path::Path;

/// A value-function approximator scoring stacked frame states.
///
/// Anything satisfying this contract is substitutable: a table lookup, a
/// linear model, a deep network. The agent never inspects internals; it
/// scores states with [`compute_q`](QFunction::compute_q), trains with
/// [`update`](QFunction::update) and treats persisted parameters as an
/// opaque blob under a directory.
///
/// Failures from these methods are fatal to the agent: training against an
/// approximator in an unknown state would silently corrupt learning.
pub trait QFunction {
    /// Per-action value estimates for the given state.
    fn compute_q(&mut self, state: &StackedState) -> Result<Vec<f32>>;

    /// Applies one batch update and returns the loss.
    ///
    /// The three slices are per-transition and of equal length: input state,
    /// index of the action taken in it, and the training target for that
    /// state/action pair.
    fn update(
        &mut self,
        states: &[StackedState],
        actions: &[usize],
        targets: &[f32],
    ) -> Result<f32>;

    /// Saves the parameters in the given directory.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from the given directory.
    fn load(&mut self, path: &Path) -> Result<()>;
}
