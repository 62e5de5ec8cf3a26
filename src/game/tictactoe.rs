use super::{Board, Opening, Outcome, Position, RuleEngine, Side};
use crate::error::MoveError;

/// Three-in-a-row on a 3x3 grid. Any empty field is a legal move; the game
/// ends on a complete row, column or diagonal, or on a full board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicTacToe;

impl TicTacToe {
    pub const SIZE: usize = 3;

    pub fn new() -> Self {
        TicTacToe
    }

    /// Side owning a complete line, if any. Lines are found by summing marks:
    /// a line is complete when its sum reaches `±size`.
    pub fn winning_side(board: &Board) -> Option<Side> {
        let n = board.size();
        let cells = board.cells();
        let target = n as i32;

        let mut sums = Vec::with_capacity(2 * n + 2);
        for i in 0..n {
            sums.push((0..n).map(|j| cells[i * n + j] as i32).sum::<i32>());
            sums.push((0..n).map(|j| cells[j * n + i] as i32).sum::<i32>());
        }
        sums.push((0..n).map(|i| cells[i * n + i] as i32).sum::<i32>());
        sums.push((0..n).map(|i| cells[i * n + (n - 1 - i)] as i32).sum::<i32>());

        if sums.contains(&target) {
            Some(Side::A)
        } else if sums.contains(&-target) {
            Some(Side::B)
        } else {
            None
        }
    }
}

impl RuleEngine for TicTacToe {
    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn new_board(&self) -> Board {
        Board::new(Self::SIZE, Opening::Empty)
    }

    fn legal_moves(&self, board: &Board, _side: Side) -> Vec<Position> {
        board.empty_fields()
    }

    fn apply_move(
        &self,
        board: &mut Board,
        pos: Position,
        side: Side,
    ) -> Result<Vec<Position>, MoveError> {
        if board.get(pos)? != 0 {
            return Err(MoveError::Occupied(pos));
        }
        board.mark(pos, side)?;
        Ok(Vec::new())
    }

    fn is_terminal(&self, board: &Board) -> bool {
        Self::winning_side(board).is_some() || board.is_full()
    }

    fn winner(&self, board: &Board) -> Option<Outcome> {
        match Self::winning_side(board) {
            Some(side) => Some(Outcome::Winner(side)),
            None if board.is_full() => Some(Outcome::Draw),
            None => None,
        }
    }

    fn allows_pass(&self) -> bool {
        false
    }

    fn side_label(&self, side: Side) -> &'static str {
        match side {
            Side::A => "X",
            Side::B => "O",
        }
    }

    fn is_legal(&self, board: &Board, pos: Position, _side: Side) -> bool {
        board.is_empty_at(pos)
    }
}
