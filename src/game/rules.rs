use super::{Board, Position, Side};
use crate::error::MoveError;

/// A move proposed by an agent: a field to mark, or a pass when the side has
/// no legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Place(Position),
    Pass,
}

impl Move {
    pub fn position(self) -> Option<Position> {
        match self {
            Move::Place(pos) => Some(pos),
            Move::Pass => None,
        }
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

impl Outcome {
    /// Reward-style score from `side`'s point of view: 1 win, -1 loss, 0 draw.
    pub fn score_for(self, side: Side) -> i8 {
        match self {
            Outcome::Winner(w) if w == side => 1,
            Outcome::Winner(_) => -1,
            Outcome::Draw => 0,
        }
    }
}

/// Move legality, board mutation and terminal detection for one game.
///
/// Engines are stateless: all game state lives in the [`Board`], so the same
/// engine value can be shared by the driver and by every agent.
pub trait RuleEngine {
    /// Short game identifier used in file names and logs
    fn name(&self) -> &'static str;

    /// A fresh board in the game's opening position
    fn new_board(&self) -> Board;

    /// Every field where `side` may legally place a mark
    fn legal_moves(&self, board: &Board, side: Side) -> Vec<Position>;

    /// Validate and apply a move, returning the positions whose owner changed
    /// besides the placed mark. The board is untouched on error.
    fn apply_move(
        &self,
        board: &mut Board,
        pos: Position,
        side: Side,
    ) -> Result<Vec<Position>, MoveError>;

    fn is_terminal(&self, board: &Board) -> bool;

    /// Game result; `None` while the game is still running.
    fn winner(&self, board: &Board) -> Option<Outcome>;

    /// Whether a side without legal moves passes instead of ending the game
    fn allows_pass(&self) -> bool;

    /// Human-facing identifier of a side ("black"/"white", "X"/"O")
    fn side_label(&self, side: Side) -> &'static str;

    fn is_legal(&self, board: &Board, pos: Position, side: Side) -> bool {
        self.legal_moves(board, side).contains(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_score() {
        assert_eq!(Outcome::Winner(Side::A).score_for(Side::A), 1);
        assert_eq!(Outcome::Winner(Side::A).score_for(Side::B), -1);
        assert_eq!(Outcome::Draw.score_for(Side::B), 0);
    }

    #[test]
    fn test_move_position() {
        let pos = Position::new(1, 2);
        assert_eq!(Move::Place(pos).position(), Some(pos));
        assert_eq!(Move::Pass.position(), None);
    }
}
