use std::fmt;

use serde::{Deserialize, Serialize};

use super::Side;
use crate::error::BoardError;

/// A field on the board, addressed as (row, column) from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Row-major index on a board of the given size
    pub fn index(self, size: usize) -> usize {
        self.row * size + self.col
    }

    pub fn from_index(index: usize, size: usize) -> Self {
        Position {
            row: index / size,
            col: index % size,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// How a board is populated on [`Board::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opening {
    /// All fields empty (Tic Tac Toe)
    Empty,
    /// Four stones in the central 2x2 block, same-side stones on the
    /// diagonals (Othello)
    CenterCross,
}

/// Square grid of marks: `+1` for side A, `-1` for side B, `0` for empty.
///
/// The board does not know about move legality; that is the job of a
/// [`RuleEngine`](super::RuleEngine). Equality compares the grid only, so a
/// board parsed from a table key equals the live board with the same marks.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<i8>,
    opening: Opening,
}

impl Board {
    /// Create a board of `size` x `size` fields, already reset to its opening
    pub fn new(size: usize, opening: Opening) -> Self {
        let mut board = Board {
            size,
            cells: vec![0; size * size],
            opening,
        };
        board.reset();
        board
    }

    /// Clear every field and place the opening stones, if any
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = 0);
        // the cross needs at least a 2x2 grid
        if self.opening == Opening::CenterCross && self.size >= 2 {
            let lo = self.size / 2 - 1;
            let hi = self.size / 2;
            for (row, col) in [(lo, lo), (lo, hi), (hi, lo), (hi, hi)] {
                let side = if row == col { Side::B } else { Side::A };
                self.cells[row * self.size + col] = side.mark();
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn opening(&self) -> Opening {
        self.opening
    }

    /// Raw cells in row-major order
    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    /// Whether signed coordinates fall inside the grid
    pub fn contains(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.size && (col as usize) < self.size
    }

    fn check_bounds(&self, pos: Position) -> Result<usize, BoardError> {
        if pos.row >= self.size || pos.col >= self.size {
            return Err(BoardError::OutOfBounds {
                position: pos,
                size: self.size,
            });
        }
        Ok(pos.index(self.size))
    }

    /// Mark value at a position
    pub fn get(&self, pos: Position) -> Result<i8, BoardError> {
        let idx = self.check_bounds(pos)?;
        Ok(self.cells[idx])
    }

    /// Side owning the field, `None` for empty or out-of-range fields
    pub fn side_at(&self, pos: Position) -> Option<Side> {
        self.get(pos).ok().and_then(Side::from_mark)
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        matches!(self.get(pos), Ok(0))
    }

    /// Place `side`'s mark on an empty field
    pub fn mark(&mut self, pos: Position, side: Side) -> Result<(), BoardError> {
        let idx = self.check_bounds(pos)?;
        if self.cells[idx] != 0 {
            return Err(BoardError::OccupiedField { position: pos });
        }
        self.cells[idx] = side.mark();
        Ok(())
    }

    /// Invert the owner of an occupied field. Empty fields stay empty.
    pub(crate) fn flip(&mut self, pos: Position) -> Result<(), BoardError> {
        let idx = self.check_bounds(pos)?;
        self.cells[idx] = -self.cells[idx];
        Ok(())
    }

    /// Number of fields holding `side`'s mark
    pub fn count(&self, side: Side) -> usize {
        let mark = side.mark();
        self.cells.iter().filter(|&&c| c == mark).count()
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 0).count()
    }

    /// True once no empty field remains
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != 0)
    }

    /// All empty fields in row-major order
    pub fn empty_fields(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == 0)
            .map(|(i, _)| Position::from_index(i, self.size))
            .collect()
    }

    /// Compact row-major encoding: `X` for side A, `O` for side B, `.` for empty.
    pub fn key(&self) -> String {
        self.cells
            .iter()
            .map(|&c| match c {
                1 => 'X',
                -1 => 'O',
                _ => '.',
            })
            .collect()
    }

    /// Parse a [`Board::key`] string. The length must be a perfect square.
    pub fn from_key(key: &str) -> Option<Board> {
        let len = key.chars().count();
        let size = (len as f64).sqrt().round() as usize;
        if size == 0 || size * size != len {
            return None;
        }
        let cells = key
            .chars()
            .map(|ch| match ch {
                'X' => Some(1),
                'O' => Some(-1),
                '.' => Some(0),
                _ => None,
            })
            .collect::<Option<Vec<i8>>>()?;
        Some(Board {
            size,
            cells,
            opening: Opening::Empty,
        })
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.cells == other.cells
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key();
        for row in key.as_bytes().chunks(self.size) {
            writeln!(f, "{}", String::from_utf8_lossy(row))?;
        }
        Ok(())
    }
}
