use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ai::Agent;
use crate::error::MoveError;
use crate::game::{Board, Move, Outcome, Position, RuleEngine, Side};

/// Scalar rewards handed to agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub win: f32,
    pub loss: f32,
    pub draw: f32,
    pub valid_move: f32,
    pub invalid_move: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            win: 1.0,
            loss: -1.0,
            draw: 0.0,
            valid_move: 0.0,
            invalid_move: -10.0,
        }
    }
}

impl RewardConfig {
    pub fn terminal_reward(&self, outcome: Outcome, side: Side) -> f32 {
        match outcome.score_for(side) {
            1 => self.win,
            -1 => self.loss,
            _ => self.draw,
        }
    }
}

/// What the driver does when an agent proposes a move the rules reject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IllegalMovePolicy {
    /// End the episode; only the offender learns from its penalty.
    #[default]
    Terminate,
    /// End the episode; the opponent additionally receives the win reward.
    TerminateAndAward,
    /// Apply the penalty and pass the turn; the episode continues.
    ForfeitTurn,
}

/// Result of feeding one proposed move to the rule engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub valid: bool,
    pub reward: f32,
    pub flipped: Vec<Position>,
    pub error: Option<MoveError>,
}

/// Per-side totals for one episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub reward_total: f32,
    pub move_count: usize,
}

/// Record returned for every episode, keyed by the game's side labels.
///
/// Serializes as `{"<label>": {reward_total, move_count}, ..., "winner": ...,
/// "epsilon_used": ..., "alpha_used": ..., "cheated": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    #[serde(flatten)]
    pub sides: BTreeMap<String, SideSummary>,
    /// Winning side's label, `"draw"`, or `None` when the episode was cut
    /// short without a winner.
    pub winner: Option<String>,
    pub epsilon_used: f32,
    pub alpha_used: f32,
    pub cheated: bool,
    #[serde(skip)]
    pub outcome: Option<Outcome>,
}

impl EpisodeRecord {
    pub fn total_moves(&self) -> usize {
        self.sides.values().map(|s| s.move_count).sum()
    }
}

/// Runs complete games between two agents.
///
/// The driver owns the board for the duration of an episode and is the only
/// caller of the rule engine's mutating operation.
pub struct EpisodeDriver<R: RuleEngine> {
    engine: R,
    board: Board,
    agents: [Box<dyn Agent>; 2],
    rewards: RewardConfig,
    policy: IllegalMovePolicy,
}

impl<R: RuleEngine> EpisodeDriver<R> {
    /// `first` and `second` must play opposite sides, in either order.
    pub fn new(
        engine: R,
        first: Box<dyn Agent>,
        second: Box<dyn Agent>,
        rewards: RewardConfig,
        policy: IllegalMovePolicy,
    ) -> Self {
        assert_ne!(first.side(), second.side(), "agents must play opposite sides");
        let agents = if first.side() == Side::A {
            [first, second]
        } else {
            [second, first]
        };
        let board = engine.new_board();
        EpisodeDriver {
            engine,
            board,
            agents,
            rewards,
            policy,
        }
    }

    pub fn engine(&self) -> &R {
        &self.engine
    }

    /// Board as left by the most recent episode.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn agent(&self, side: Side) -> &dyn Agent {
        self.agents[side.index()].as_ref()
    }

    pub fn agent_mut(&mut self, side: Side) -> &mut dyn Agent {
        self.agents[side.index()].as_mut()
    }

    /// Feed one proposed move for `side` to the rule engine. Rejected moves
    /// leave the board untouched and come back as `valid: false`.
    pub fn apply_step(&mut self, side: Side, mv: Move) -> StepOutcome {
        let result = match mv {
            Move::Place(pos) => self.engine.apply_move(&mut self.board, pos, side),
            Move::Pass => Err(MoveError::Pass),
        };
        match result {
            Ok(flipped) => StepOutcome {
                valid: true,
                reward: self.rewards.valid_move,
                flipped,
                error: None,
            },
            Err(e) => {
                if e.is_illegal() {
                    log::debug!("{} proposed an illegal move: {e}", self.engine.side_label(side));
                } else {
                    log::warn!("{} proposed an invalid move: {e}", self.engine.side_label(side));
                }
                StepOutcome {
                    valid: false,
                    reward: self.rewards.invalid_move,
                    flipped: Vec::new(),
                    error: Some(e),
                }
            }
        }
    }

    /// Play one game to completion with the given exploration and learning
    /// rates.
    pub fn play_episode(&mut self, epsilon: f32, alpha: f32) -> EpisodeRecord {
        self.board = self.engine.new_board();
        for agent in self.agents.iter_mut() {
            agent.reset_for_episode(epsilon, alpha);
        }

        // Past this many rejected moves a forfeit episode is cut short.
        let illegal_limit = self.board.cells().len();
        let mut move_counts = [0usize; 2];
        let mut illegal_moves = 0;
        let mut cheated = false;
        let mut side = Side::A;

        let outcome = loop {
            if self.engine.is_terminal(&self.board) {
                let outcome = self.engine.winner(&self.board).unwrap_or(Outcome::Draw);
                self.settle(outcome);
                break Some(outcome);
            }

            let legal = self.engine.legal_moves(&self.board, side);
            if legal.is_empty() {
                if !self.engine.allows_pass() {
                    // a game without passes should have reported terminal
                    log::warn!(
                        "{} has no legal move in a {} position that is not terminal, ending episode",
                        self.engine.side_label(side),
                        self.engine.name()
                    );
                    let outcome = self.engine.winner(&self.board).unwrap_or(Outcome::Draw);
                    self.settle(outcome);
                    break Some(outcome);
                }
                log::debug!("{} has no legal move and passes", self.engine.side_label(side));
                side = side.other();
                continue;
            }

            let agent = &mut self.agents[side.index()];
            agent.learn(&self.board, false);
            let mv = agent.select_action(&self.board, &legal);
            move_counts[side.index()] += 1;

            let step = self.apply_step(side, mv);
            self.agents[side.index()].store_reward(step.reward);

            if step.valid {
                side = side.other();
                continue;
            }

            illegal_moves += 1;
            let policy = match self.policy {
                IllegalMovePolicy::ForfeitTurn if illegal_moves > illegal_limit => {
                    log::warn!("{illegal_moves} illegal moves in one episode, terminating");
                    IllegalMovePolicy::Terminate
                }
                policy => policy,
            };
            match policy {
                IllegalMovePolicy::ForfeitTurn => {
                    side = side.other();
                }
                IllegalMovePolicy::Terminate => {
                    cheated = true;
                    self.agents[side.index()].learn(&self.board, true);
                    break None;
                }
                IllegalMovePolicy::TerminateAndAward => {
                    cheated = true;
                    self.agents[side.index()].learn(&self.board, true);
                    let opponent = &mut self.agents[side.other().index()];
                    opponent.store_reward(self.rewards.win);
                    opponent.learn(&self.board, true);
                    break Some(Outcome::Winner(side.other()));
                }
            }
        };

        if cheated {
            log::warn!("episode terminated after an illegal move");
        }

        let sides = Side::BOTH
            .iter()
            .map(|&s| {
                (
                    self.engine.side_label(s).to_string(),
                    SideSummary {
                        reward_total: self.agents[s.index()].episode_reward(),
                        move_count: move_counts[s.index()],
                    },
                )
            })
            .collect();

        let winner = outcome.map(|o| match o {
            Outcome::Winner(s) => self.engine.side_label(s).to_string(),
            Outcome::Draw => "draw".to_string(),
        });

        EpisodeRecord {
            sides,
            winner,
            epsilon_used: epsilon,
            alpha_used: alpha,
            cheated,
            outcome,
        }
    }

    /// Hand out terminal rewards and let both agents make their final update.
    fn settle(&mut self, outcome: Outcome) {
        for agent in self.agents.iter_mut() {
            let reward = self.rewards.terminal_reward(outcome, agent.side());
            agent.store_reward(reward);
            agent.learn(&self.board, true);
        }
    }
}

/// Seed for one side's agent, derived from the run seed so both agents of a
/// seeded run draw from unrelated streams.
pub fn side_seed(run_seed: u64, side: Side) -> u64 {
    // splitmix64 step over the run seed, one increment per side
    let mut z = run_seed.wrapping_add(0x9e37_79b9_7f4a_7c15u64.wrapping_mul(side.index() as u64 + 1));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
