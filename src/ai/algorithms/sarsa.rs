use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::tabular::{self, TabularConfig};
use crate::ai::agent::{epsilon_greedy, Agent, EpisodeMemory};
use crate::ai::value_table::ValueTable;
use crate::error::CheckpointError;
use crate::game::{Board, Move, Position, RuleEngine, Side};

/// On-policy tabular learner.
///
/// `learn(s', false)` already commits to the next action `a'` with the
/// epsilon-greedy policy and bootstraps from `Q(s', a')`. The following
/// `select_action(s')` returns that same `a'`, so the value used in the update
/// is the value of the move actually played.
pub struct SarsaAgent<R: RuleEngine> {
    engine: R,
    side: Side,
    table: ValueTable,
    config: TabularConfig,
    memory: EpisodeMemory,
    planned: Option<(Board, Position)>,
    epsilon: f32,
    alpha: f32,
    rng: StdRng,
}

impl<R: RuleEngine> SarsaAgent<R> {
    pub fn new(engine: R, side: Side, config: TabularConfig) -> Self {
        Self::with_rng(engine, side, config, StdRng::from_os_rng())
    }

    pub fn with_seed(engine: R, side: Side, config: TabularConfig, seed: u64) -> Self {
        Self::with_rng(engine, side, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(engine: R, side: Side, config: TabularConfig, rng: StdRng) -> Self {
        SarsaAgent {
            engine,
            side,
            table: config.new_table(),
            config,
            memory: EpisodeMemory::new(),
            planned: None,
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

    /// Action committed to by the last non-terminal `learn`, if any.
    pub fn planned_action(&self) -> Option<Position> {
        self.planned.as_ref().map(|(_, a)| *a)
    }

    fn choose(&mut self, state: &Board, legal_moves: &[Position]) -> Position {
        let table = &mut self.table;
        epsilon_greedy(&mut self.rng, self.epsilon, legal_moves, |a| {
            table.get_or_insert_default(state, a)
        })
    }
}

impl<R: RuleEngine> Agent for SarsaAgent<R> {
    fn side(&self) -> Side {
        self.side
    }

    fn name(&self) -> &str {
        "SARSA"
    }

    fn reset_for_episode(&mut self, epsilon: f32, alpha: f32) {
        self.epsilon = epsilon;
        self.alpha = alpha;
        self.planned = None;
        self.memory.reset();
    }

    fn select_action(&mut self, state: &Board, legal_moves: &[Position]) -> Move {
        let action = if legal_moves.is_empty() {
            Move::Pass
        } else {
            match self.planned.take() {
                Some((planned_state, a))
                    if planned_state == *state && self.engine.is_legal(state, a, self.side) =>
                {
                    Move::Place(a)
                }
                _ => Move::Place(self.choose(state, legal_moves)),
            }
        };
        self.memory.record_action(state, action);
        action
    }

    fn store_reward(&mut self, reward: f32) {
        self.memory.store_reward(reward);
    }

    fn learn(&mut self, new_state: &Board, terminal: bool) {
        self.planned = None;
        let mut future = 0.0;
        if !terminal {
            let legal = self.engine.legal_moves(new_state, self.side);
            if !legal.is_empty() {
                let next = self.choose(new_state, &legal);
                future = self.table.get_or_insert_default(new_state, next);
                self.planned = Some((new_state.clone(), next));
            }
        }

        if let Some((state, action, reward)) = self.memory.last_triple() {
            let q = self.table.get_or_insert_default(&state, action);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::algorithms::QLearningAgent;
    use crate::game::{Othello, TicTacToe};

    const GREEDY: Position = Position { row: 2, col: 2 };

    /// `s1` of the fixed two-step trace: (2,2) is worth 1.0, every other move -0.5.
    fn preset_next_values(table: &mut ValueTable, s1: &Board) {
        for pos in s1.empty_fields() {
            table.set(s1, pos, -0.5);
        }
        table.set(s1, GREEDY, 1.0);
    }

    fn sarsa(seed: u64) -> SarsaAgent<TicTacToe> {
        SarsaAgent::with_seed(TicTacToe::new(), Side::A, TabularConfig::default(), seed)
    }

    #[test]
    fn test_bootstrap_differs_from_q_learning() {
        let s0 = TicTacToe::new().new_board();
        let s1 = Board::from_key("X...O....").unwrap();
        let a0 = Position::new(0, 0);
        let mut saw_difference = false;

        for seed in 0..20 {
            let mut q_agent =
                QLearningAgent::with_seed(TicTacToe::new(), Side::A, TabularConfig::default(), seed);
            q_agent.reset_for_episode(1.0, 0.5);
            q_agent.select_action(&s0, &[a0]);
            q_agent.store_reward(0.0);
            preset_next_values(q_agent.table_mut(), &s1);
            q_agent.learn(&s1, false);
            let q_value = q_agent.table().get(&s0, a0).unwrap();
            assert!((q_value - 0.5).abs() < 1e-6, "q-learning got {q_value}");

            let mut s_agent = sarsa(seed);
            s_agent.reset_for_episode(1.0, 0.5);
            s_agent.select_action(&s0, &[a0]);
            s_agent.store_reward(0.0);
            preset_next_values(s_agent.table_mut(), &s1);
            s_agent.learn(&s1, false);
            let s_value = s_agent.table().get(&s0, a0).unwrap();

            let planned = s_agent.planned_action().unwrap();
            if planned == GREEDY {
                assert!((s_value - 0.5).abs() < 1e-6, "sarsa got {s_value}");
            } else {
                // 0.1 + 0.5 * (0.9 * -0.5 - 0.1)
                assert!((s_value + 0.175).abs() < 1e-6, "sarsa got {s_value}");
                assert!(s_value < q_value);
                saw_difference = true;
            }
        }
        assert!(saw_difference, "every seed explored the greedy move");
    }

    #[test]
    fn test_planned_action_is_played_next() {
        let mut agent = sarsa(4);
        let s0 = TicTacToe::new().new_board();
        let s1 = Board::from_key("X...O....").unwrap();
        agent.reset_for_episode(1.0, 0.5);
        agent.select_action(&s0, &[Position::new(0, 0)]);
        agent.store_reward(0.0);
        agent.learn(&s1, false);

        let planned = agent.planned_action().unwrap();
        let legal = s1.empty_fields();
        assert!(legal.contains(&planned));
        assert_eq!(agent.select_action(&s1, &legal), Move::Place(planned));
        assert_eq!(agent.planned_action(), None);
    }

    #[test]
    fn test_plan_reused_for_board_parsed_from_key() {
        let engine = Othello::new();
        let mut agent = SarsaAgent::with_seed(engine, Side::A, TabularConfig::default(), 5);
        let live = engine.new_board();
        agent.reset_for_episode(1.0, 0.5);
        agent.learn(&live, false);
        let planned = agent.planned_action().unwrap();

        let parsed = Board::from_key(&live.key()).unwrap();
        let legal = engine.legal_moves(&parsed, Side::A);
        assert_eq!(agent.select_action(&parsed, &legal), Move::Place(planned));
    }

    #[test]
    fn test_plan_ignored_for_different_state() {
        let mut agent = sarsa(9);
        let s1 = Board::from_key("X...O....").unwrap();
        agent.reset_for_episode(0.0, 0.5);
        agent.learn(&s1, false);
        assert!(agent.planned_action().is_some());

        let other = Board::from_key("XO.......").unwrap();
        let only = [Position::new(2, 0)];
        assert_eq!(agent.select_action(&other, &only), Move::Place(only[0]));
    }

    #[test]
    fn test_terminal_learn_clears_plan() {
        let mut agent = sarsa(2);
        let s0 = TicTacToe::new().new_board();
        agent.reset_for_episode(0.0, 0.5);
        agent.select_action(&s0, &[Position::new(1, 1)]);
        agent.store_reward(-1.0);
        agent.learn(&Board::from_key("OOOXX.X..").unwrap(), true);

        assert_eq!(agent.planned_action(), None);
        // 0.1 + 0.5 * (-1.0 - 0.1)
        let q = agent.table().get(&s0, Position::new(1, 1)).unwrap();
        assert!((q + 0.45).abs() < 1e-6, "got {q}");
    }
}
