//! Lazily populated table of state-action values for the tabular learners.

use std::collections::{BTreeMap, HashMap};

use crate::error::CheckpointError;
use crate::game::{Board, Position};

/// Value handed to a (state, action) pair the first time it is looked up.
/// Slightly positive so that untried moves look attractive to a greedy policy.
pub const OPTIMISTIC_INITIAL_VALUE: f32 = 0.1;

/// Mapping from (state, action) to a value estimate.
///
/// Keys are strings of the form `"<board key>|<row>,<col>"`, the same shape
/// that is written to and read from disk.
#[derive(Debug, Clone)]
pub struct ValueTable {
    values: HashMap<String, f32>,
    initial_value: f32,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::with_initial_value(OPTIMISTIC_INITIAL_VALUE)
    }

    pub fn with_initial_value(initial_value: f32) -> Self {
        ValueTable {
            values: HashMap::new(),
            initial_value,
        }
    }

    pub fn key(state: &Board, action: Position) -> String {
        format!("{}|{},{}", state.key(), action.row, action.col)
    }

    /// Parse a table key back into its board and action. The action must lie
    /// on the board.
    pub fn parse_key(key: &str) -> Option<(Board, Position)> {
        let (cells, action) = key.split_once('|')?;
        let board = Board::from_key(cells)?;
        let (row, col) = action.split_once(',')?;
        let action = Position::new(row.trim().parse().ok()?, col.trim().parse().ok()?);
        if action.row >= board.size() || action.col >= board.size() {
            return None;
        }
        Some((board, action))
    }

    /// Value for (state, action), inserting the initial value for unseen pairs.
    pub fn get_or_insert_default(&mut self, state: &Board, action: Position) -> f32 {
        *self
            .values
            .entry(Self::key(state, action))
            .or_insert(self.initial_value)
    }

    /// Value for (state, action) without inserting anything.
    pub fn get(&self, state: &Board, action: Position) -> Option<f32> {
        self.values.get(&Self::key(state, action)).copied()
    }

    pub fn set(&mut self, state: &Board, action: Position, value: f32) {
        self.values.insert(Self::key(state, action), value);
    }

    pub fn initial_value(&self) -> f32 {
        self.initial_value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat key -> value snapshot, sorted by key.
    pub fn export_table(&self) -> BTreeMap<String, f32> {
        self.values
            .iter()
            .map(|(k, &v)| (k.clone(), v))
            .collect()
    }

    /// Merge a key -> value mapping into the table.
    ///
    /// Every entry is validated first: keys must parse, describe a board of
    /// `board_size`, and values must be finite. On error nothing is inserted.
    pub fn import_table<I>(&mut self, entries: I, board_size: usize) -> Result<usize, CheckpointError>
    where
        I: IntoIterator<Item = (String, f32)>,
    {
        let mut validated = Vec::new();
        for (key, value) in entries {
            match Self::parse_key(&key) {
                Some((board, _)) if board.size() == board_size => {}
                _ => return Err(CheckpointError::MalformedKey(key)),
            }
            if !value.is_finite() {
                return Err(CheckpointError::NonFiniteValue { key, value });
            }
            validated.push((key, value));
        }
        let count = validated.len();
        self.values.extend(validated);
        Ok(count)
    }
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}
