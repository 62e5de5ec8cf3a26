use std::path::PathBuf;

use crate::game::Position;

/// Errors raised by direct board access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("position {position} is outside the {size}x{size} board")]
    OutOfBounds { position: Position, size: usize },

    #[error("field {position} is already occupied")]
    OccupiedField { position: Position },
}

/// Errors raised by a rule engine when a move is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("illegal move at {0}: field is occupied")]
    Occupied(Position),

    #[error("illegal move at {0}: no opposing stones would be flipped")]
    NoCapture(Position),

    #[error("illegal pass: legal moves are available")]
    Pass,
}

impl MoveError {
    /// True for rule violations (as opposed to out-of-range coordinates,
    /// which are programming errors).
    pub fn is_illegal(&self) -> bool {
        !matches!(self, MoveError::Board(BoardError::OutOfBounds { .. }))
    }
}

/// Errors that can occur while saving or loading tables and weights.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("malformed table key '{0}'")]
    MalformedKey(String),

    #[error("non-finite value {value} for table key '{key}'")]
    NonFiniteValue { key: String, value: f32 },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("incompatible saved run: {0}")]
    Incompatible(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to write results to {path}: {source}")]
    Results {
        path: PathBuf,
        source: CheckpointError,
    },
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_error_display() {
        let err = BoardError::OutOfBounds {
            position: Position::new(3, 1),
            size: 3,
        };
        assert_eq!(err.to_string(), "position (3, 1) is outside the 3x3 board");
    }

    #[test]
    fn test_move_error_display() {
        let err = MoveError::NoCapture(Position::new(0, 0));
        assert_eq!(
            err.to_string(),
            "illegal move at (0, 0): no opposing stones would be flipped"
        );
    }

    #[test]
    fn test_move_error_is_illegal() {
        assert!(MoveError::Occupied(Position::new(1, 1)).is_illegal());
        assert!(MoveError::Pass.is_illegal());
        let oob = MoveError::from(BoardError::OutOfBounds {
            position: Position::new(9, 9),
            size: 8,
        });
        assert!(!oob.is_illegal());
    }

    #[test]
    fn test_checkpoint_error_display() {
        let err = CheckpointError::MalformedKey("bogus".to_string());
        assert_eq!(err.to_string(), "malformed table key 'bogus'");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("tabular.gamma must be in [0, 1]".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: tabular.gamma must be in [0, 1]"
        );
    }
}
