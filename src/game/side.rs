use serde::{Deserialize, Serialize};

/// One of the two sides of a game. `A` moves first and owns the `+1` mark,
/// `B` owns `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// Get the other side
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Integer mark stored on the board for this side
    pub fn mark(self) -> i8 {
        match self {
            Side::A => 1,
            Side::B => -1,
        }
    }

    /// Slot of this side in two-element per-side arrays
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// Inverse of [`Side::mark`]; `0` and anything else map to `None`.
    pub fn from_mark(mark: i8) -> Option<Side> {
        match mark {
            1 => Some(Side::A),
            -1 => Some(Side::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_side() {
        assert_eq!(Side::A.other(), Side::B);
        assert_eq!(Side::B.other(), Side::A);
    }

    #[test]
    fn test_marks_roundtrip() {
        for side in Side::BOTH {
            assert_eq!(Side::from_mark(side.mark()), Some(side));
        }
        assert_eq!(Side::from_mark(0), None);
    }
}
