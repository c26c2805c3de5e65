//! Exploration schedule.
use serde::{Deserialize, Serialize};

/// Linearly annealed epsilon-greedy exploration schedule.
///
/// The rate is derived from a decision counter instead of being decremented
/// in place, so it reaches `end_rate` exactly after `anneal_span` decisions
/// and never drifts below it. During burn-in the scheduler explores
/// unconditionally and the counter does not advance; annealing is measured
/// in post-burn-in decisions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationScheduler {
    start_rate: f64,
    end_rate: f64,
    anneal_span: usize,
    steps: usize,
}

impl ExplorationScheduler {
    /// Constructs a schedule annealing from `start_rate` to `end_rate` over
    /// `anneal_span` decisions.
    pub fn new(start_rate: f64, end_rate: f64, anneal_span: usize) -> Self {
        Self {
            start_rate,
            end_rate,
            anneal_span,
            steps: 0,
        }
    }

    /// Reconstructs a schedule at a given decision count, for restore.
    pub fn with_steps(start_rate: f64, end_rate: f64, anneal_span: usize, steps: usize) -> Self {
        Self {
            start_rate,
            end_rate,
            anneal_span,
            steps,
        }
    }

    /// Current probability of taking a random action.
    pub fn rate(&self) -> f64 {
        if self.steps >= self.anneal_span {
            self.end_rate
        } else {
            let d = (self.start_rate - self.end_rate) / self.anneal_span as f64;
            (self.start_rate - d * self.steps as f64).max(self.end_rate)
        }
    }

    /// Post-burn-in decisions taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Decides whether the next action is random.
    ///
    /// Burn-in forces exploration without advancing the schedule; memory
    /// must be seeded with diverse transitions before greedy actions mean
    /// anything. Afterwards each call advances the schedule one step and
    /// flips a coin at the annealed rate.
    pub fn should_explore(&mut self, burn_in: bool) -> bool {
        if burn_in {
            return true;
        }
        if self.steps < self.anneal_span {
            self.steps += 1;
        }
        fastrand::f64() < self.rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burn_in_freezes_the_schedule() {
        let mut s = ExplorationScheduler::new(1.0, 0.1, 10);
        for _ in 0..100 {
            assert!(s.should_explore(true));
        }
        assert_eq!(s.rate(), 1.0);
        assert_eq!(s.steps(), 0);
    }

    #[test]
    fn rate_is_non_increasing_and_floors_exactly() {
        let span = 10;
        let mut s = ExplorationScheduler::new(1.0, 0.1, span);
        let mut prev = s.rate();
        for _ in 0..span {
            s.should_explore(false);
            let rate = s.rate();
            assert!(rate <= prev);
            prev = rate;
        }
        assert_eq!(s.rate(), 0.1);

        // Further decisions stay at the floor.
        for _ in 0..1000 {
            s.should_explore(false);
        }
        assert_eq!(s.rate(), 0.1);
    }

    #[test]
    fn always_explores_at_full_rate() {
        let mut s = ExplorationScheduler::new(1.0, 1.0, 5);
        for _ in 0..50 {
            assert!(s.should_explore(false));
        }
    }
}
