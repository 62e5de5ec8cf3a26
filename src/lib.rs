//! # ML Board Games
//!
//! Othello and Tic Tac Toe rule engines with reinforcement-learning agents
//! (random, tabular Q-learning, tabular SARSA and DQN via the Burn ML
//! framework) trained against each other by an episode driver.
//!
//! ## Modules
//!
//! - [`game`]: Board, sides and the Othello / Tic Tac Toe rule engines
//! - [`ai`]: Agent trait, learning agents, value table, network and state encoding
//! - [`training`]: Episode driver, trainer, replay buffer, schedules and metrics
//! - [`checkpoint`]: Saving and restoring tables, weights and results
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
