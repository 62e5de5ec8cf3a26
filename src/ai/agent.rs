use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::CheckpointError;
use crate::game::{Board, Move, Position, Side};

/// A single step of experience for the replay-based learner:
/// (state, action, reward, next state, terminal).
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Board,
    pub action: Position,
    pub reward: f32,
    pub next_state: Board,
    pub terminal: bool,
}

/// Where an agent is within one turn of an episode.
///
/// `Idle -> select_action -> AwaitingReward -> store_reward -> AwaitingLearn
/// -> learn -> Idle | Terminal`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Idle,
    AwaitingReward,
    AwaitingLearn,
    Terminal,
}

/// Per-episode bookkeeping shared by every agent: the last (state, action,
/// reward) triple, the reward total and the turn phase.
#[derive(Debug, Clone)]
pub struct EpisodeMemory {
    last_state: Option<Board>,
    last_action: Option<Position>,
    reward: Option<f32>,
    episode_reward: f32,
    moves: usize,
    phase: AgentPhase,
}

impl EpisodeMemory {
    pub fn new() -> Self {
        EpisodeMemory {
            last_state: None,
            last_action: None,
            reward: None,
            episode_reward: 0.0,
            moves: 0,
            phase: AgentPhase::Idle,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Remember the state an action was chosen in. A pass clears the action,
    /// so no transition is recorded for it.
    pub fn record_action(&mut self, state: &Board, action: Move) {
        self.last_state = Some(state.clone());
        self.last_action = action.position();
        self.moves += 1;
        self.phase = AgentPhase::AwaitingReward;
    }

    pub fn store_reward(&mut self, reward: f32) {
        self.reward = Some(reward);
        self.episode_reward += reward;
        self.phase = AgentPhase::AwaitingLearn;
    }

    pub fn finish_learn(&mut self, terminal: bool) {
        self.phase = if terminal {
            AgentPhase::Terminal
        } else {
            AgentPhase::Idle
        };
    }

    /// The (state, action, reward) triple awaiting an update, once all three
    /// have been set in this episode.
    pub fn last_triple(&self) -> Option<(Board, Position, f32)> {
        match (&self.last_state, self.last_action, self.reward) {
            (Some(state), Some(action), Some(reward)) => Some((state.clone(), action, reward)),
            _ => None,
        }
    }

    pub fn last_action(&self) -> Option<Position> {
        self.last_action
    }

    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }
}

impl Default for EpisodeMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Universal interface for all agents.
///
/// The episode driver only ever calls these methods, so every variant
/// (random, tabular, replay-based) is interchangeable behind `Box<dyn Agent>`.
pub trait Agent {
    /// Side this agent plays for its whole lifetime.
    fn side(&self) -> Side;

    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// Start a new episode with this episode's exploration and learning
    /// rates. Learned values are kept.
    fn reset_for_episode(&mut self, epsilon: f32, alpha: f32);

    /// Pick one of `legal_moves`, or [`Move::Pass`] when there is none.
    fn select_action(&mut self, state: &Board, legal_moves: &[Position]) -> Move;

    /// Record the reward for the most recent action.
    fn store_reward(&mut self, reward: f32);

    /// Value-update step after observing `new_state`.
    fn learn(&mut self, new_state: &Board, terminal: bool);

    /// Sum of rewards stored during the current episode.
    fn episode_reward(&self) -> f32;

    /// Save learned parameters under `dir`, using `label` to tell sides apart.
    fn save_to_dir(&self, _dir: &Path, _label: &str) -> Result<(), CheckpointError> {
        Ok(())
    }

    /// Load parameters written by [`Agent::save_to_dir`].
    fn load_from_dir(&mut self, _dir: &Path, _label: &str) -> Result<(), CheckpointError> {
        Ok(())
    }
}

/// Epsilon-greedy choice over `legal`: with probability `epsilon` a uniform
/// pick, otherwise the highest-valued move with ties broken uniformly.
///
/// `legal` must not be empty.
pub(crate) fn epsilon_greedy(
    rng: &mut StdRng,
    epsilon: f32,
    legal: &[Position],
    mut value: impl FnMut(Position) -> f32,
) -> Position {
    if rng.random::<f32>() < epsilon {
        return legal[rng.random_range(0..legal.len())];
    }

    let mut best = Vec::with_capacity(legal.len());
    let mut best_value = f32::NEG_INFINITY;
    for &pos in legal {
        let v = value(pos);
        if v > best_value {
            best_value = v;
            best.clear();
            best.push(pos);
        } else if v == best_value {
            best.push(pos);
        }
    }
    if best.is_empty() {
        // every value was NaN
        return legal[rng.random_range(0..legal.len())];
    }
    best[rng.random_range(0..best.len())]
}
