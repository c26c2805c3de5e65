//! Scripted collaborators, used for tests.
use crate::base::{Env, EventSink, FeedbackAccumulator, Observation, QFunction, RawFrame};
use crate::frame_stack::StackedState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// One recorded training call of a [`DummyQFunction`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTrace {
    /// Action indices of the batch.
    pub actions: Vec<usize>,

    /// Targets of the batch.
    pub targets: Vec<f32>,
}

/// A value function with fixed per-action scores.
///
/// Scores never change; every update is recorded instead of applied, so
/// tests can assert on exactly what the agent trained with and when. The
/// scores double as the persisted "parameters", which makes checkpoint
/// round-trips observable.
#[derive(Debug, Clone)]
pub struct DummyQFunction {
    scores: Vec<f32>,
    updates: Vec<UpdateTrace>,
}

#[derive(Serialize, Deserialize)]
struct DummyParams {
    scores: Vec<f32>,
}

const PARAMS_FILE: &str = "q_scores.yaml";

impl DummyQFunction {
    /// Constructs a stub scoring every state with the given values.
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            updates: Vec::new(),
        }
    }

    /// The recorded update batches, oldest first.
    pub fn updates(&self) -> &[UpdateTrace] {
        &self.updates
    }

    /// The fixed scores.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }
}

impl QFunction for DummyQFunction {
    fn compute_q(&mut self, _state: &StackedState) -> Result<Vec<f32>> {
        Ok(self.scores.clone())
    }

    fn update(
        &mut self,
        _states: &[StackedState],
        actions: &[usize],
        targets: &[f32],
    ) -> Result<f32> {
        self.updates.push(UpdateTrace {
            actions: actions.to_vec(),
            targets: targets.to_vec(),
        });

        let loss = actions
            .iter()
            .zip(targets.iter())
            .map(|(&a, &t)| (t - self.scores[a]).powi(2))
            .sum::<f32>()
            / actions.len().max(1) as f32;
        Ok(loss)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path.join(PARAMS_FILE))?;
        let params = DummyParams {
            scores: self.scores.clone(),
        };
        file.write_all(serde_yaml::to_string(&params)?.as_bytes())?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path.join(PARAMS_FILE))?;
        let params: DummyParams = serde_yaml::from_reader(BufReader::new(file))?;
        self.scores = params.scores;
        Ok(())
    }
}

/// One tick of a [`ScriptedEnv`] tape.
#[derive(Debug, Clone)]
pub struct ScriptedTick {
    /// Frame shown on this tick.
    pub frame: RawFrame,

    /// Score change the game reports on this tick.
    pub score: f32,

    /// True if the game ends on this tick.
    pub game_over: bool,
}

impl ScriptedTick {
    /// A quiet tick showing `frame`.
    pub fn quiet(frame: RawFrame) -> Self {
        Self {
            frame,
            score: 0.0,
            game_over: false,
        }
    }
}

/// Environment replaying a fixed tape of ticks, cycling at the end.
///
/// Score and game-over events flow through a [`FeedbackAccumulator`], the
/// same path a real game adapter uses, and every received action is
/// recorded for assertions.
pub struct ScriptedEnv {
    num_actions: usize,
    tape: Vec<ScriptedTick>,
    cursor: usize,
    feedback: FeedbackAccumulator,
    actions: Vec<usize>,
}

impl ScriptedEnv {
    /// Constructs an environment over a non-empty tape.
    pub fn new(num_actions: usize, tape: Vec<ScriptedTick>) -> Self {
        assert!(!tape.is_empty(), "a scripted tape must have at least one tick");
        Self {
            num_actions,
            tape,
            cursor: 0,
            feedback: FeedbackAccumulator::new(),
            actions: Vec::new(),
        }
    }

    /// The actions received so far.
    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    fn advance(&mut self) -> Observation {
        let tick = self.tape[self.cursor % self.tape.len()].clone();
        self.cursor += 1;

        if tick.score != 0.0 {
            self.feedback.on_score(tick.score);
        }
        if tick.game_over {
            self.feedback.on_game_over();
        }
        let (reward, terminal) = self.feedback.take();

        Observation {
            frame: tick.frame,
            reward,
            terminal,
        }
    }
}

impl Env for ScriptedEnv {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn reset(&mut self) -> Result<Observation> {
        self.cursor = 0;
        self.feedback = FeedbackAccumulator::new();
        Ok(self.advance())
    }

    fn step(&mut self, action: usize) -> Result<Observation> {
        self.actions.push(action);
        Ok(self.advance())
    }
}
