//! Transitions stored in the replay memory.
use crate::frame_stack::StackedState;

/// One state/action/outcome record.
///
/// A transition is *open* between the decision that created it and the next
/// decision: the action has been taken, but the reward it earns, whether it
/// ended the episode and the state it leads to are only observed one
/// environment step later. Closing fills in all three at once; a closed
/// transition is immutable from then on.
#[derive(Clone, Debug)]
pub struct Transition {
    /// State the decision was made in.
    pub state_in: StackedState,

    /// Index of the chosen action.
    pub action: usize,

    /// Reward earned by the action, accumulated over its repeat window.
    /// Unset while open.
    pub reward: Option<f32>,

    /// True if the action ended the episode.
    pub terminal: bool,

    /// State the action led to. Unset while open; present but never
    /// bootstrapped from when `terminal` is set.
    pub state_out: Option<StackedState>,
}

impl Transition {
    /// Opens a transition for an action just taken.
    pub fn open(state_in: StackedState, action: usize) -> Self {
        Self {
            state_in,
            action,
            reward: None,
            terminal: false,
            state_out: None,
        }
    }

    /// True until the outcome has been recorded.
    pub fn is_open(&self) -> bool {
        self.reward.is_none()
    }

    pub(crate) fn close(&mut self, reward: f32, state_out: StackedState, terminal: bool) {
        self.reward = Some(reward);
        self.state_out = Some(state_out);
        self.terminal = terminal;
    }
}
