use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::{Agent, EpisodeMemory};
use crate::game::{Board, Move, Position, Side};

/// An agent that selects uniformly at random from legal moves.
pub struct RandomAgent {
    side: Side,
    rng: StdRng,
    memory: EpisodeMemory,
}

impl RandomAgent {
    pub fn new(side: Side) -> Self {
        Self::with_rng(side, StdRng::from_os_rng())
    }

    pub fn with_seed(side: Side, seed: u64) -> Self {
        Self::with_rng(side, StdRng::seed_from_u64(seed))
    }

    fn with_rng(side: Side, rng: StdRng) -> Self {
        RandomAgent {
            side,
            rng,
            memory: EpisodeMemory::new(),
        }
    }
}

impl Agent for RandomAgent {
    fn side(&self) -> Side {
        self.side
    }

    fn name(&self) -> &str {
        "Random"
    }

    fn reset_for_episode(&mut self, _epsilon: f32, _alpha: f32) {
        self.memory.reset();
    }

    fn select_action(&mut self, state: &Board, legal_moves: &[Position]) -> Move {
        let action = if legal_moves.is_empty() {
            Move::Pass
        } else {
            Move::Place(legal_moves[self.rng.random_range(0..legal_moves.len())])
        };
        self.memory.record_action(state, action);
        action
    }

    fn store_reward(&mut self, reward: f32) {
        self.memory.store_reward(reward);
    }

    fn learn(&mut self, _new_state: &Board, terminal: bool) {
        self.memory.finish_learn(terminal);
    }

    fn episode_reward(&self) -> f32 {
        self.memory.episode_reward()
    }
}
