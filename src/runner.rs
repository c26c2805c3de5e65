//! Driving an agent against an environment.
use crate::{
    base::{Env, QFunction},
    Agent,
};
use anyhow::Result;
use log::info;

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: usize,

    /// Episodes finished within the run.
    pub episodes: usize,

    /// Mean return over finished episodes; zero if none finished.
    pub mean_return: f32,

    /// Best return over finished episodes; zero if none finished.
    pub best_return: f32,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Owns the interaction loop between an [`Env`] and an [`Agent`].
///
/// One tick is one exchange:
///
/// ```mermaid
/// graph LR
///     E[Env] -->|frame, reward, terminal| A[Agent]
///     A -->|action| E
/// ```
///
/// The runner keeps per-episode returns on the environment side of the
/// loop and logs a running summary every `log_interval` episodes. It stops
/// after `max_ticks` ticks; the agent's own checkpoint cadence takes care
/// of persistence within the run.
pub struct Runner {
    max_ticks: usize,
    log_interval: usize,
}

impl Runner {
    /// Constructs a runner executing `max_ticks` environment ticks.
    pub fn new(max_ticks: usize) -> Self {
        Self {
            max_ticks,
            log_interval: 100,
        }
    }

    /// Sets the episode interval of summary logging.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Runs the loop to completion.
    pub fn run<E, Q>(&self, env: &mut E, agent: &mut Agent<Q>) -> Result<RunSummary>
    where
        E: Env,
        Q: QFunction,
    {
        let mut obs = env.reset()?;
        let mut returns: Vec<f32> = Vec::new();
        let mut episode_return = 0.0;

        for _ in 0..self.max_ticks {
            let action = agent.step(&obs.frame, obs.reward, obs.terminal)?;

            episode_return += obs.reward;
            if obs.terminal {
                returns.push(episode_return);
                episode_return = 0.0;
                if self.log_interval > 0 && returns.len() % self.log_interval == 0 {
                    let recent = &returns[returns.len() - self.log_interval..];
                    info!(
                        "{} episodes, mean return over last {}: {}",
                        returns.len(),
                        self.log_interval,
                        recent.iter().sum::<f32>() / recent.len() as f32,
                    );
                }
            }

            obs = env.step(action)?;
        }

        let episodes = returns.len();
        let (mean_return, best_return) = if episodes > 0 {
            (
                returns.iter().sum::<f32>() / episodes as f32,
                returns.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
            )
        } else {
            (0.0, 0.0)
        };

        Ok(RunSummary {
            ticks: self.max_ticks,
            episodes,
            mean_return,
            best_return,
        })
    }
}
