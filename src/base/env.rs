//! Environment.
use anyhow::Result;

/// Raw pixel frame as emitted by an environment.
///
/// Row-major bytes, one (grayscale) or three (RGB, interleaved) channels.
/// Frames of any size are accepted; preprocessing warps them to the fixed
/// network input size.
#[derive(Clone, Debug)]
pub struct RawFrame {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Number of color channels, 1 or 3.
    pub channels: u8,

    /// Pixel bytes, `width * height * channels` of them.
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Constructs a grayscale frame.
    pub fn gray(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels: 1,
            data,
        }
    }

    /// Constructs an interleaved RGB frame.
    pub fn rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }
}

/// What an environment emits on every tick.
///
/// `reward` and `terminal` are consequences of the action applied on the
/// *previous* tick; the environment does not attribute them synchronously.
#[derive(Clone, Debug)]
pub struct Observation {
    /// The current game frame.
    pub frame: RawFrame,

    /// Reward resulting from the previously applied action.
    pub reward: f32,

    /// True if the previously applied action ended the episode.
    pub terminal: bool,
}

/// Represents a frame-based environment.
///
/// The agent consumes observations one tick at a time and feeds back one
/// discrete action index per tick. Construction and game rules are entirely
/// the implementor's business.
pub trait Env {
    /// Number of discrete actions the environment accepts.
    fn num_actions(&self) -> usize;

    /// Starts a fresh episode and returns the initial observation.
    fn reset(&mut self) -> Result<Observation>;

    /// Applies an action and advances the environment by one tick.
    fn step(&mut self, action: usize) -> Result<Observation>;
}

/// Reward-relevant events a game reports while it runs.
///
/// Environment implementations register a sink once at construction and call
/// it from wherever scoring happens, instead of exposing mutable score
/// globals that callers would have to poll or patch into.
pub trait EventSink {
    /// The score changed by `delta` since the last event.
    fn on_score(&mut self, delta: f32);

    /// The episode ended.
    fn on_game_over(&mut self);
}

/// Folds score events into per-tick `(reward, terminal)` feedback.
///
/// The standard [`EventSink`] used by environment adapters: events arriving
/// between two ticks accumulate here and are drained into the next
/// [`Observation`] by [`take`](FeedbackAccumulator::take).
#[derive(Debug, Default)]
pub struct FeedbackAccumulator {
    reward: f32,
    terminal: bool,
}

impl FeedbackAccumulator {
    /// Constructs an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accumulated feedback and resets for the next tick.
    pub fn take(&mut self) -> (f32, bool) {
        let out = (self.reward, self.terminal);
        self.reward = 0.0;
        self.terminal = false;
        out
    }
}

impl EventSink for FeedbackAccumulator {
    fn on_score(&mut self, delta: f32) {
        self.reward += delta;
    }

    fn on_game_over(&mut self) {
        self.terminal = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_accumulates_between_ticks() {
        let mut feedback = FeedbackAccumulator::new();
        feedback.on_score(1.0);
        feedback.on_score(-0.5);
        assert_eq!(feedback.take(), (0.5, false));
        assert_eq!(feedback.take(), (0.0, false));

        feedback.on_game_over();
        assert_eq!(feedback.take(), (0.0, true));
    }
}
