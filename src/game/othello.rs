use super::{Board, Opening, Outcome, Position, RuleEngine, Side};
use crate::error::{ConfigError, MoveError};

/// The eight compass directions, scanned in this order when flipping.
pub const DIRECTIONS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Flip-capture rules (Othello/Reversi) on a square board of even size.
///
/// A placement is legal when it flanks at least one straight run of opposing
/// stones that is closed by one of the mover's own stones. A side without a
/// legal move passes; the game ends only when neither side can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Othello {
    size: usize,
}

impl Othello {
    pub const DEFAULT_SIZE: usize = 8;

    pub fn new() -> Self {
        Othello {
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Board of `size` x `size`; the centre cross needs an even size >= 4.
    pub fn with_size(size: usize) -> Result<Self, ConfigError> {
        if size < 4 || size % 2 != 0 {
            return Err(ConfigError::Validation(format!(
                "othello board size must be even and >= 4, got {size}"
            )));
        }
        Ok(Othello { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Opposing stones flanked in one direction from `pos`.
    ///
    /// Walks outward collecting opposing stones; the run only counts when it
    /// is closed by a friendly stone before the edge or an empty field.
    fn capture_run(
        board: &Board,
        pos: Position,
        side: Side,
        (dr, dc): (isize, isize),
    ) -> Vec<Position> {
        let own = side.mark();
        let mut run = Vec::new();
        let mut r = pos.row as isize + dr;
        let mut c = pos.col as isize + dc;
        while board.contains(r, c) {
            let next = Position::new(r as usize, c as usize);
            let mark = board.cells()[next.index(board.size())];
            if mark == -own {
                run.push(next);
            } else if mark == own {
                return run;
            } else {
                break;
            }
            r += dr;
            c += dc;
        }
        Vec::new()
    }

    /// Every stone that placing `side` at `pos` would flip, in direction
    /// order. Empty for occupied or off-board fields.
    pub fn captures(&self, board: &Board, pos: Position, side: Side) -> Vec<Position> {
        if !board.is_empty_at(pos) {
            return Vec::new();
        }
        DIRECTIONS
            .iter()
            .flat_map(|&dir| Self::capture_run(board, pos, side, dir))
            .collect()
    }

    fn has_capture(board: &Board, pos: Position, side: Side) -> bool {
        DIRECTIONS
            .iter()
            .any(|&dir| !Self::capture_run(board, pos, side, dir).is_empty())
    }

    fn has_any_move(board: &Board, side: Side) -> bool {
        board
            .empty_fields()
            .into_iter()
            .any(|pos| Self::has_capture(board, pos, side))
    }
}

impl Default for Othello {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine for Othello {
    fn name(&self) -> &'static str {
        "othello"
    }

    fn new_board(&self) -> Board {
        Board::new(self.size, Opening::CenterCross)
    }

    fn legal_moves(&self, board: &Board, side: Side) -> Vec<Position> {
        board
            .empty_fields()
            .into_iter()
            .filter(|&pos| Self::has_capture(board, pos, side))
            .collect()
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
        let flips = self.captures(board, pos, side);
        if flips.is_empty() {
            return Err(MoveError::NoCapture(pos));
        }
        board.mark(pos, side)?;
        for &flipped in &flips {
            board.flip(flipped)?;
        }
        Ok(flips)
    }

    fn is_terminal(&self, board: &Board) -> bool {
        !Self::has_any_move(board, Side::A) && !Self::has_any_move(board, Side::B)
    }

    fn winner(&self, board: &Board) -> Option<Outcome> {
        if !self.is_terminal(board) {
            return None;
        }
        let a = board.count(Side::A);
        let b = board.count(Side::B);
        Some(match a.cmp(&b) {
            std::cmp::Ordering::Greater => Outcome::Winner(Side::A),
            std::cmp::Ordering::Less => Outcome::Winner(Side::B),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    fn allows_pass(&self) -> bool {
        true
    }

    fn side_label(&self, side: Side) -> &'static str {
        match side {
            Side::A => "black",
            Side::B => "white",
        }
    }

    fn is_legal(&self, board: &Board, pos: Position, side: Side) -> bool {
        board.is_empty_at(pos) && Self::has_capture(board, pos, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn board_from_rows(rows: &[&str]) -> Board {
        Board::from_key(&rows.concat()).unwrap()
    }

    /// Independent reference: a field is legal iff some direction holds one or
    /// more opposing stones followed directly by a friendly stone.
    fn naive_legal(board: &Board, side: Side) -> Vec<Position> {
        let n = board.size() as isize;
        let mut out = Vec::new();
        for row in 0..n {
            for col in 0..n {
                let pos = Position::new(row as usize, col as usize);
                if board.get(pos).unwrap() != 0 {
                    continue;
                }
                let legal = DIRECTIONS.iter().any(|&(dr, dc)| {
                    let mut k = 1;
                    loop {
                        let (r, c) = (row + dr * k, col + dc * k);
                        if r < 0 || c < 0 || r >= n || c >= n {
                            return false;
                        }
                        let v = board.get(Position::new(r as usize, c as usize)).unwrap();
                        if v == -side.mark() {
                            k += 1;
                        } else {
                            return v == side.mark() && k > 1;
                        }
                    }
                });
                if legal {
                    out.push(pos);
                }
            }
        }
        out
    }

    #[test]
    fn test_opening_has_four_single_capture_moves() {
        let engine = Othello::new();
        let board = engine.new_board();
        let legal = engine.legal_moves(&board, Side::A);
        assert_eq!(
            legal,
            vec![
                Position::new(2, 3),
                Position::new(3, 2),
                Position::new(4, 5),
                Position::new(5, 4)
            ]
        );

        for pos in legal {
            let mut after = board.clone();
            let flips = engine.apply_move(&mut after, pos, Side::A).unwrap();
            assert_eq!(flips.len(), 1);
            assert_eq!(after.count(Side::A), 4);
            assert_eq!(after.count(Side::B), 1);
            assert_eq!(after.count(Side::A) + after.count(Side::B), 5);
        }
    }

    #[test]
    fn test_opening_on_small_board() {
        let engine = Othello::with_size(4).unwrap();
        let board = engine.new_board();
        assert_eq!(engine.legal_moves(&board, Side::A).len(), 4);
        assert_eq!(engine.legal_moves(&board, Side::B).len(), 4);
    }

    #[test]
    fn test_is_legal_agrees_with_legal_moves() {
        let engine = Othello::new();
        let board = engine.new_board();
        for side in Side::BOTH {
            let legal = engine.legal_moves(&board, side);
            for row in 0..8 {
                for col in 0..8 {
                    let pos = Position::new(row, col);
                    assert_eq!(engine.is_legal(&board, pos, side), legal.contains(&pos));
                }
            }
        }
        assert!(!engine.is_legal(&board, Position::new(8, 0), Side::A));
        assert!(engine.allows_pass());
    }

    #[test]
    fn test_with_size_rejects_odd_or_tiny() {
        assert!(Othello::with_size(5).is_err());
        assert!(Othello::with_size(2).is_err());
        assert!(Othello::with_size(6).is_ok());
    }

    #[test]
    fn test_apply_occupied_is_illegal() {
        let engine = Othello::new();
        let mut board = engine.new_board();
        let before = board.clone();
        let err = engine
            .apply_move(&mut board, Position::new(3, 3), Side::A)
            .unwrap_err();
        assert_eq!(err, MoveError::Occupied(Position::new(3, 3)));
        assert!(err.is_illegal());
        assert_eq!(board, before);
    }

    #[test]
    fn test_apply_without_capture_is_illegal() {
        let engine = Othello::new();
        let mut board = engine.new_board();
        let before = board.clone();
        let err = engine
            .apply_move(&mut board, Position::new(0, 0), Side::A)
            .unwrap_err();
        assert_eq!(err, MoveError::NoCapture(Position::new(0, 0)));
        assert_eq!(board, before);
    }

    #[test]
    fn test_apply_out_of_bounds() {
        let engine = Othello::new();
        let mut board = engine.new_board();
        let err = engine
            .apply_move(&mut board, Position::new(8, 0), Side::A)
            .unwrap_err();
        assert!(matches!(err, MoveError::Board(_)));
        assert!(!err.is_illegal());
    }

    #[test]
    fn test_flips_in_several_directions() {
        let engine = Othello::with_size(4).unwrap();
        let mut board = board_from_rows(&[
            "X.X.", //
            "OOO.", //
            ".O..", //
            "XO.X",
        ]);
        let flips = engine
            .apply_move(&mut board, Position::new(2, 0), Side::A)
            .unwrap();
        // up: (1,0) closed by (0,0); up-right: (1,1) closed by (0,2);
        // right: (2,1) runs into an empty field, so it stays.
        assert_eq!(flips, vec![Position::new(1, 0), Position::new(1, 1)]);
        assert_eq!(board.side_at(Position::new(1, 0)), Some(Side::A));
        assert_eq!(board.side_at(Position::new(1, 1)), Some(Side::A));
        assert_eq!(board.side_at(Position::new(2, 1)), Some(Side::B));
    }

    #[test]
    fn test_run_open_at_edge_is_not_captured() {
        let engine = Othello::with_size(4).unwrap();
        let board = board_from_rows(&[
            ".OO.", //
            "....", //
            "....", //
            "....",
        ]);
        // A has no friendly stone to close either run
        assert!(engine.legal_moves(&board, Side::A).is_empty());
    }

    #[test]
    fn test_single_side_without_moves_is_not_terminal() {
        let engine = Othello::with_size(4).unwrap();
        let board = board_from_rows(&[
            "XO..", //
            "....", //
            "....", //
            "....",
        ]);
        assert_eq!(engine.legal_moves(&board, Side::A), vec![Position::new(0, 2)]);
        assert!(engine.legal_moves(&board, Side::B).is_empty());
        assert!(!engine.is_terminal(&board));
        assert_eq!(engine.winner(&board), None);
    }

    #[test]
    fn test_terminal_on_non_full_board() {
        let engine = Othello::with_size(4).unwrap();
        let board = board_from_rows(&[
            "XX..", //
            "....", //
            "....", //
            "...O",
        ]);
        assert!(engine.is_terminal(&board));
        assert!(!board.is_full());
        assert_eq!(engine.winner(&board), Some(Outcome::Winner(Side::A)));
    }

    #[test]
    fn test_winner_by_counts() {
        let engine = Othello::with_size(4).unwrap();
        let draw = board_from_rows(&["X...", "....", "....", "...O"]);
        assert_eq!(engine.winner(&draw), Some(Outcome::Draw));
        let b_wins = board_from_rows(&["X...", "....", "....", "..OO"]);
        assert_eq!(engine.winner(&b_wins), Some(Outcome::Winner(Side::B)));
    }

    #[test]
    fn test_legal_moves_match_reference_on_random_games() {
        let engine = Othello::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let mut board = engine.new_board();
            let mut side = Side::A;
            while !engine.is_terminal(&board) {
                for s in Side::BOTH {
                    assert_eq!(engine.legal_moves(&board, s), naive_legal(&board, s));
                }
                let legal = engine.legal_moves(&board, side);
                if legal.is_empty() {
                    side = side.other();
                    continue;
                }
                let pos = legal[rng.random_range(0..legal.len())];
                let total_before = board.count(Side::A) + board.count(Side::B);
                let own_before = board.count(side);
                let opp_before = board.count(side.other());

                let flips = engine.apply_move(&mut board, pos, side).unwrap();

                assert!(!flips.is_empty());
                assert_eq!(board.count(Side::A) + board.count(Side::B), total_before + 1);
                assert_eq!(board.count(side), own_before + flips.len() + 1);
                assert_eq!(board.count(side.other()), opp_before - flips.len());
                side = side.other();
            }
            assert!(engine.winner(&board).is_some());
        }
    }
}
