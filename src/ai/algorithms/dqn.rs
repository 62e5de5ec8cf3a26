use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::agent::{epsilon_greedy, Agent, EpisodeMemory, Transition};
use crate::ai::networks::{DqnNetwork, DqnNetworkConfig};
use crate::ai::state_encoding::{encode_state, encode_states_batch};
use crate::error::CheckpointError;
use crate::game::{Board, Move, Position, Side};
use crate::training::replay_buffer::ReplayBuffer;

pub type InferBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<InferBackend>;

type DqnOptimizer = OptimizerAdaptor<Adam, DqnNetwork<TrainBackend>, TrainBackend>;

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub gamma: f32,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub replay_capacity: usize,
    /// Gradient steps between copies of the behavior network into the
    /// target network.
    pub target_update_interval: usize,
    pub hidden_size: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            gamma: 0.9,
            learning_rate: 1e-3,
            batch_size: 32,
            replay_capacity: 2000,
            target_update_interval: 300,
            hidden_size: 256,
        }
    }
}

/// Replay-based approximate Q-learner with a behavior network, a periodically
/// synced target network, and an Adam optimizer.
pub struct DqnAgent {
    side: Side,
    board_size: usize,
    q_network: DqnNetwork<TrainBackend>,
    target_network: DqnNetwork<InferBackend>,
    optimizer: DqnOptimizer,
    net_config: DqnNetworkConfig,
    replay_buffer: ReplayBuffer,
    config: DqnConfig,
    device: <TrainBackend as Backend>::Device,
    memory: EpisodeMemory,
    epsilon: f32,
    step_count: usize,
    last_loss: Option<f32>,
    rng: StdRng,
}

impl DqnAgent {
    pub fn new(board_size: usize, side: Side, config: DqnConfig) -> Self {
        let buffer = ReplayBuffer::new(config.replay_capacity);
        Self::build(board_size, side, config, buffer, StdRng::from_os_rng())
    }

    pub fn with_seed(board_size: usize, side: Side, config: DqnConfig, seed: u64) -> Self {
        let buffer = ReplayBuffer::with_seed(config.replay_capacity, seed.wrapping_add(1));
        Self::build(board_size, side, config, buffer, StdRng::seed_from_u64(seed))
    }

    fn build(
        board_size: usize,
        side: Side,
        config: DqnConfig,
        replay_buffer: ReplayBuffer,
        rng: StdRng,
    ) -> Self {
        let device = Default::default();
        let net_config =
            DqnNetworkConfig::new(board_size * board_size).with_hidden_size(config.hidden_size);
        let q_network: DqnNetwork<TrainBackend> = net_config.init(&device);
        let target_network = q_network.valid();

        DqnAgent {
            side,
            board_size,
            q_network,
            target_network,
            optimizer: AdamConfig::new().init(),
            net_config,
            replay_buffer,
            config,
            device,
            memory: EpisodeMemory::new(),
            epsilon: 0.0,
            step_count: 0,
            last_loss: None,
            rng,
        }
    }

    /// Behavior network output for `board`, one value per field.
    pub fn q_values(&self, board: &Board) -> Vec<f32> {
        let input = encode_state::<InferBackend>(board, self.side, &self.device);
        Self::to_vec(self.q_network.valid().forward(input))
    }

    /// Target network output for `board`, one value per field.
    pub fn target_q_values(&self, board: &Board) -> Vec<f32> {
        let input = encode_state::<InferBackend>(board, self.side, &self.device);
        Self::to_vec(self.target_network.forward(input))
    }

    fn to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Vec<f32> {
        tensor
            .into_data()
            .to_vec::<f32>()
            .expect("f32 tensor data extraction")
    }

    /// Copy the behavior network's parameters into the target network.
    pub fn sync_target(&mut self) {
        self.target_network = self.q_network.valid();
    }

    /// One gradient step on a uniformly sampled mini-batch. Returns the loss,
    /// or `None` while the buffer holds fewer than `batch_size` transitions.
    fn train_step(&mut self) -> Option<f32> {
        let batch = self.replay_buffer.sample(self.config.batch_size)?;
        let batch_size = batch.len();
        let fields = self.board_size * self.board_size;

        let states: Vec<Board> = batch.iter().map(|t| t.state.clone()).collect();
        let next_states: Vec<Board> = batch.iter().map(|t| t.next_state.clone()).collect();

        // Targets start as the target network's estimate at s. Only the taken
        // action's slot gets the Bellman value; the other slots pull the
        // behavior network toward the target network.
        let current = encode_states_batch::<InferBackend>(&states, self.side, &self.device);
        let mut target_data = Self::to_vec(self.target_network.forward(current));
        let next = encode_states_batch::<InferBackend>(&next_states, self.side, &self.device);
        let next_q = Self::to_vec(self.target_network.forward(next));

        for (i, transition) in batch.iter().enumerate() {
            let slot = i * fields + transition.action.index(self.board_size);
            target_data[slot] = if transition.terminal {
                transition.reward
            } else {
                let best = next_q[i * fields..(i + 1) * fields]
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max);
                transition.reward + self.config.gamma * best
            };
        }

        let targets = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(target_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, fields as i32]);

        let inputs = encode_states_batch::<TrainBackend>(&states, self.side, &self.device);
        let predicted = self.q_network.forward(inputs);
        let diff = predicted - targets;
        let loss = (diff.clone() * diff).mean();

        let loss_val: f32 = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 loss tensor extraction")[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.step_count += 1;
        if self.step_count % self.config.target_update_interval == 0 {
            self.sync_target();
            log::debug!(
                "DQN {}: target network synced after {} steps",
                self.side,
                self.step_count
            );
        }

        Some(loss_val)
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }
}

impl Agent for DqnAgent {
    fn side(&self) -> Side {
        self.side
    }

    fn name(&self) -> &str {
        "DQN"
    }

    fn reset_for_episode(&mut self, epsilon: f32, _alpha: f32) {
        self.epsilon = epsilon;
        self.memory.reset();
    }

    fn select_action(&mut self, state: &Board, legal_moves: &[Position]) -> Move {
        let action = if legal_moves.is_empty() {
            Move::Pass
        } else {
            // Forward pass only happens when exploiting.
            let mut q_cache: Option<Vec<f32>> = None;
            let size = self.board_size;
            let (q_network, device, side) = (&self.q_network, &self.device, self.side);
            Move::Place(epsilon_greedy(&mut self.rng, self.epsilon, legal_moves, |a| {
                let q = q_cache.get_or_insert_with(|| {
                    let input = encode_state::<InferBackend>(state, side, device);
                    Self::to_vec(q_network.valid().forward(input))
                });
                q[a.index(size)]
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
            self.replay_buffer.push(Transition {
                state,
                action,
                reward,
                next_state: new_state.clone(),
                terminal,
            });
            if let Some(loss) = self.train_step() {
                self.last_loss = Some(loss);
            }
        }
        self.memory.finish_learn(terminal);
    }

    fn episode_reward(&self) -> f32 {
        self.memory.episode_reward()
    }

    fn save_to_dir(&self, dir: &Path, label: &str) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();
        self.q_network
            .clone()
            .valid()
            .save_file(dir.join(format!("{label}_behavior")), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;
        self.target_network
            .clone()
            .save_file(dir.join(format!("{label}_target")), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;
        Ok(())
    }

    fn load_from_dir(&mut self, dir: &Path, label: &str) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();

        let q: DqnNetwork<TrainBackend> = self
            .net_config
            .init(&self.device)
            .load_file(dir.join(format!("{label}_behavior")), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        let target: DqnNetwork<InferBackend> = self
            .net_config
            .init(&self.device)
            .load_file(dir.join(format!("{label}_target")), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;

        self.q_network = q;
        self.target_network = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{RuleEngine, TicTacToe};

    fn small_config() -> DqnConfig {
        DqnConfig {
            batch_size: 2,
            replay_capacity: 10,
            target_update_interval: 3,
            hidden_size: 16,
            ..Default::default()
        }
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{x} != {y}");
        }
    }

    /// Play `a` on `s` for `reward`, then learn from `next`.
    fn step(agent: &mut DqnAgent, s: &Board, a: Position, reward: f32, next: &Board, terminal: bool) {
        assert_eq!(agent.select_action(s, &[a]), Move::Place(a));
        agent.store_reward(reward);
        agent.learn(next, terminal);
    }

    #[test]
    fn test_greedy_selects_legal_action() {
        let mut agent = DqnAgent::with_seed(3, Side::A, small_config(), 1);
        agent.reset_for_episode(0.0, 0.0);
        let board = Board::from_key("XO.X.O...").unwrap();
        let legal = TicTacToe::new().legal_moves(&board, Side::A);

        let q = agent.q_values(&board);
        let best = legal
            .iter()
            .copied()
            .max_by(|x, y| q[x.index(3)].total_cmp(&q[y.index(3)]))
            .unwrap();
        for _ in 0..5 {
            assert_eq!(agent.select_action(&board, &legal), Move::Place(best));
        }
    }

    #[test]
    fn test_passes_without_moves() {
        let mut agent = DqnAgent::with_seed(3, Side::B, small_config(), 2);
        let board = TicTacToe::new().new_board();
        assert_eq!(agent.select_action(&board, &[]), Move::Pass);
    }

    #[test]
    fn test_target_starts_in_sync() {
        let agent = DqnAgent::with_seed(3, Side::A, small_config(), 3);
        let board = Board::from_key("X...O....").unwrap();
        assert_close(&agent.q_values(&board), &agent.target_q_values(&board));
    }

    #[test]
    fn test_first_learn_stores_nothing() {
        let mut agent = DqnAgent::with_seed(3, Side::A, small_config(), 4);
        agent.reset_for_episode(0.5, 0.5);
        agent.learn(&TicTacToe::new().new_board(), false);
        assert_eq!(agent.replay_len(), 0);
        assert_eq!(agent.step_count(), 0);
    }

    #[test]
    fn test_training_starts_at_batch_size_and_syncs_target() {
        let mut agent = DqnAgent::with_seed(3, Side::A, small_config(), 5);
        agent.reset_for_episode(0.0, 0.0);
        let s0 = TicTacToe::new().new_board();
        let s1 = Board::from_key("X...O....").unwrap();
        let s2 = Board::from_key("XX..OO...").unwrap();
        let s3 = Board::from_key("XXXOO....").unwrap();

        step(&mut agent, &s0, Position::new(0, 0), 0.0, &s1, false);
        assert_eq!(agent.replay_len(), 1);
        assert_eq!(agent.step_count(), 0);
        assert!(agent.last_loss().is_none());

        step(&mut agent, &s1, Position::new(0, 1), 0.0, &s2, false);
        assert_eq!(agent.step_count(), 1);
        assert!(agent.last_loss().unwrap().is_finite());

        step(&mut agent, &s2, Position::new(0, 2), 1.0, &s3, true);
        assert_eq!(agent.step_count(), 2);
        let before_sync = s1.clone();
        let diverged = agent.q_values(&before_sync) != agent.target_q_values(&before_sync);
        assert!(diverged, "target must lag the behavior network between syncs");

        step(&mut agent, &s0, Position::new(1, 1), 0.0, &s1, false);
        assert_eq!(agent.step_count(), 3);
        assert_close(&agent.q_values(&s1), &agent.target_q_values(&s1));
    }

    /// Mean squared error between the behavior output at `s` and the target
    /// network's output at `s` with `slot` replaced by `value`.
    fn expected_loss(agent: &DqnAgent, s: &Board, slot: usize, value: f32) -> f32 {
        let q = agent.q_values(s);
        let mut target = agent.target_q_values(s);
        target[slot] = value;
        q.iter().zip(&target).map(|(a, b)| (a - b) * (a - b)).sum::<f32>() / q.len() as f32
    }

    #[test]
    fn test_loss_uses_bellman_value_in_taken_slot() {
        let config = DqnConfig {
            batch_size: 1,
            replay_capacity: 1,
            target_update_interval: 1000,
            learning_rate: 1e-2,
            ..small_config()
        };
        let mut agent = DqnAgent::with_seed(3, Side::A, config, 8);
        let s0 = TicTacToe::new().new_board();

        // terminal: the taken slot is the reward alone
        agent.reset_for_episode(0.0, 0.0);
        let a0 = Position::new(0, 0);
        let expected = expected_loss(&agent, &s0, a0.index(3), 1.0);
        step(&mut agent, &s0, a0, 1.0, &Board::from_key("X........").unwrap(), true);
        let loss = agent.last_loss().unwrap();
        assert!((loss - expected).abs() < 1e-5, "terminal loss {loss} != {expected}");

        // one gradient step moves the behavior network away from the target
        let q = agent.q_values(&s0);
        let t = agent.target_q_values(&s0);
        assert!(q.iter().zip(&t).any(|(a, b)| (a - b).abs() > 1e-4));

        // non-terminal: reward plus discounted max of the target network at s'
        agent.reset_for_episode(0.0, 0.0);
        let a1 = Position::new(1, 1);
        let s1 = Board::from_key("....X....").unwrap();
        let best_next = agent
            .target_q_values(&s1)
            .into_iter()
            .fold(f32::NEG_INFINITY, f32::max);
        let expected = expected_loss(&agent, &s0, a1.index(3), 0.5 + 0.9 * best_next);
        step(&mut agent, &s0, a1, 0.5, &s1, false);
        let loss = agent.last_loss().unwrap();
        assert!((loss - expected).abs() < 1e-5, "bootstrapped loss {loss} != {expected}");
        assert_eq!(agent.step_count(), 2);
    }

    #[test]
    fn test_reset_keeps_buffer() {
        let mut agent = DqnAgent::with_seed(3, Side::A, small_config(), 6);
        agent.reset_for_episode(0.0, 0.0);
        let s0 = TicTacToe::new().new_board();
        step(&mut agent, &s0, Position::new(0, 0), 0.0, &s0, false);
        agent.reset_for_episode(0.2, 0.0);
        assert_eq!(agent.replay_len(), 1);
        assert_eq!(agent.epsilon(), 0.2);
    }

    #[test]
    fn test_save_and_load_weights() {
        let dir = tempfile::tempdir().unwrap();
        let agent = DqnAgent::with_seed(3, Side::A, small_config(), 7);
        agent.save_to_dir(dir.path(), "X").unwrap();

        let mut other = DqnAgent::with_seed(3, Side::A, small_config(), 8);
        other.load_from_dir(dir.path(), "X").unwrap();

        let board = Board::from_key("X...O....").unwrap();
        assert_close(&other.q_values(&board), &agent.q_values(&board));
        assert_close(&other.target_q_values(&board), &agent.target_q_values(&board));
    }

    #[test]
    fn test_load_missing_weights_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = DqnAgent::with_seed(3, Side::A, small_config(), 9);
        assert!(matches!(
            agent.load_from_dir(dir.path(), "O"),
            Err(CheckpointError::ModelLoad(_))
        ));
    }
}
