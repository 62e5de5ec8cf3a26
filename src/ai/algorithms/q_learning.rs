use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::tabular::{self, TabularConfig};
use crate::ai::agent::{epsilon_greedy, Agent, EpisodeMemory};
use crate::ai::value_table::ValueTable;
use crate::error::CheckpointError;
use crate::game::{Board, Move, Position, RuleEngine, Side};

/// Off-policy tabular learner: bootstraps from the best next move regardless
/// of which move is actually played.
pub struct QLearningAgent<R: RuleEngine> {
    engine: R,
    side: Side,
    table: ValueTable,
    config: TabularConfig,
    memory: EpisodeMemory,
    epsilon: f32,
    alpha: f32,
    rng: StdRng,
}

impl<R: RuleEngine> QLearningAgent<R> {
    pub fn new(engine: R, side: Side, config: TabularConfig) -> Self {
        Self::with_rng(engine, side, config, StdRng::from_os_rng())
    }

    pub fn with_seed(engine: R, side: Side, config: TabularConfig, seed: u64) -> Self {
        Self::with_rng(engine, side, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(engine: R, side: Side, config: TabularConfig, rng: StdRng) -> Self {
        QLearningAgent {
            engine,
            side,
            table: config.new_table(),
            config,
            memory: EpisodeMemory::new(),
            epsilon: 0.0,
            alpha: 0.0,
            rng,
        }
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ValueTable {
        &mut self.table
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl<R: RuleEngine> Agent for QLearningAgent<R> {
    fn side(&self) -> Side {
        self.side
    }

    fn name(&self) -> &str {
        "Q-learning"
    }

    fn reset_for_episode(&mut self, epsilon: f32, alpha: f32) {
        self.epsilon = epsilon;
        self.alpha = alpha;
        self.memory.reset();
    }

    fn select_action(&mut self, state: &Board, legal_moves: &[Position]) -> Move {
        let action = if legal_moves.is_empty() {
            Move::Pass
        } else {
            let table = &mut self.table;
            Move::Place(epsilon_greedy(&mut self.rng, self.epsilon, legal_moves, |a| {
                table.get_or_insert_default(state, a)
            }))
        };
        self.memory.record_action(state, action);
        action
    }

    fn store_reward(&mut self, reward: f32) {
        self.memory.store_reward(reward);
    }

    fn learn(&mut self, new_state: &Board, terminal: bool) {
        if let Some((state, action, reward)) = self.memory.last_triple() {
            let q = self.table.get_or_insert_default(&state, action);
            let future = if terminal {
                0.0
            } else {
                tabular::max_next_value(&mut self.table, &self.engine, new_state, self.side)
            };
            let updated = tabular::td_update(q, self.alpha, reward + self.config.gamma * future);
            self.table.set(&state, action, updated);
        }
        self.memory.finish_learn(terminal);
    }

    fn episode_reward(&self) -> f32 {
        self.memory.episode_reward()
    }

    fn save_to_dir(&self, dir: &Path, label: &str) -> Result<(), CheckpointError> {
        tabular::save_table(&self.table, dir, label)
    }

    fn load_from_dir(&mut self, dir: &Path, label: &str) -> Result<(), CheckpointError> {
        let size = self.engine.new_board().size();
        tabular::load_table(&mut self.table, size, dir, label)
    }
}
