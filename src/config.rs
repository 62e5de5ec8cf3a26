use std::fmt;
use std::path::Path;

use crate::ai::{DqnConfig, TabularConfig};
use crate::error::ConfigError;
use crate::game::{Othello, TicTacToe};
use crate::training::episode::{IllegalMovePolicy, RewardConfig};
use crate::training::trainer::TrainerConfig;

/// Which rule engine a run plays.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    #[default]
    Othello,
    #[value(name = "tictactoe")]
    TicTacToe,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Othello => f.write_str("othello"),
            GameKind::TicTacToe => f.write_str("tictactoe"),
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub kind: GameKind,
    /// Side length; the game's own default when unset.
    pub board_size: Option<usize>,
}

impl GameConfig {
    pub fn effective_board_size(&self) -> usize {
        match (self.kind, self.board_size) {
            (_, Some(size)) => size,
            (GameKind::Othello, None) => Othello::DEFAULT_SIZE,
            (GameKind::TicTacToe, None) => TicTacToe::SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub illegal_move_policy: IllegalMovePolicy,
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub training: TrainerConfig,
    pub tabular: TabularConfig,
    pub dqn: DqnConfig,
    pub rewards: RewardConfig,
    pub rules: RulesConfig,
}

fn check_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!("{name} must be in [0, 1]")));
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.game.effective_board_size();
        match self.game.kind {
            GameKind::Othello => {
                Othello::with_size(size)?;
            }
            GameKind::TicTacToe if size != TicTacToe::SIZE => {
                return Err(ConfigError::Validation(format!(
                    "tictactoe is played on a 3x3 board, got game.board_size = {size}"
                )));
            }
            GameKind::TicTacToe => {}
        }

        let t = &self.training;
        if t.num_episodes == 0 {
            return Err(ConfigError::Validation(
                "training.num_episodes must be > 0".into(),
            ));
        }
        if t.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }
        check_unit("training.epsilon_start", t.epsilon_start)?;
        check_unit("training.epsilon_floor", t.epsilon_floor)?;
        check_unit("training.alpha_start", t.alpha_start)?;
        check_unit("training.alpha_floor", t.alpha_floor)?;
        if t.epsilon_floor > t.epsilon_start {
            return Err(ConfigError::Validation(
                "training.epsilon_floor must be <= training.epsilon_start".into(),
            ));
        }
        if t.alpha_floor > t.alpha_start {
            return Err(ConfigError::Validation(
                "training.alpha_floor must be <= training.alpha_start".into(),
            ));
        }

        check_unit("tabular.gamma", self.tabular.gamma)?;
        if !self.tabular.initial_value.is_finite() {
            return Err(ConfigError::Validation(
                "tabular.initial_value must be finite".into(),
            ));
        }

        check_unit("dqn.gamma", self.dqn.gamma)?;
        if self.dqn.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "dqn.learning_rate must be > 0".into(),
            ));
        }
        if self.dqn.batch_size == 0 {
            return Err(ConfigError::Validation(
                "dqn.batch_size must be > 0".into(),
            ));
        }
        if self.dqn.replay_capacity < self.dqn.batch_size {
            return Err(ConfigError::Validation(
                "dqn.replay_capacity must be >= dqn.batch_size".into(),
            ));
        }
        if self.dqn.target_update_interval == 0 {
            return Err(ConfigError::Validation(
                "dqn.target_update_interval must be > 0".into(),
            ));
        }
        if self.dqn.hidden_size < 2 {
            return Err(ConfigError::Validation(
                "dqn.hidden_size must be >= 2".into(),
            ));
        }

        let r = &self.rewards;
        if ![r.win, r.loss, r.draw, r.valid_move, r.invalid_move]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ConfigError::Validation(
                "rewards must be finite".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
