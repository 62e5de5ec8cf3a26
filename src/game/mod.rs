//! Game logic: board representation, sides, and the rule engines for
//! Othello (flip-capture) and Tic Tac Toe (three-in-a-row).

mod board;
mod othello;
mod rules;
mod side;
mod tictactoe;

pub use board::{Board, Opening, Position};
pub use othello::{Othello, DIRECTIONS};
pub use rules::{Move, Outcome, RuleEngine};
pub use side::Side;
pub use tictactoe::TicTacToe;
