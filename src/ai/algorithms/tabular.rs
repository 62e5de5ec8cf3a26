use std::path::Path;

use crate::ai::value_table::{ValueTable, OPTIMISTIC_INITIAL_VALUE};
use crate::checkpoint::{read_table, write_table};
use crate::error::CheckpointError;
use crate::game::{Board, RuleEngine, Side};

/// Hyperparameters shared by the tabular learners.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    pub gamma: f32,
    pub initial_value: f32,
}

impl Default for TabularConfig {
    fn default() -> Self {
        TabularConfig {
            gamma: 0.9,
            initial_value: OPTIMISTIC_INITIAL_VALUE,
        }
    }
}

impl TabularConfig {
    pub fn new_table(&self) -> ValueTable {
        ValueTable::with_initial_value(self.initial_value)
    }
}

/// Highest table value over `side`'s legal moves in `state`, or 0 when there
/// are none.
pub(crate) fn max_next_value<R: RuleEngine>(
    table: &mut ValueTable,
    engine: &R,
    state: &Board,
    side: Side,
) -> f32 {
    engine
        .legal_moves(state, side)
        .into_iter()
        .map(|a| table.get_or_insert_default(state, a))
        .reduce(f32::max)
        .unwrap_or(0.0)
}

/// Temporal-difference step: `q + alpha * (target - q)`.
pub(crate) fn td_update(q: f32, alpha: f32, target: f32) -> f32 {
    q + alpha * (target - q)
}

fn table_path(dir: &Path, label: &str) -> std::path::PathBuf {
    dir.join(format!("{label}_table.json"))
}

pub(crate) fn save_table(table: &ValueTable, dir: &Path, label: &str) -> Result<(), CheckpointError> {
    write_table(&table_path(dir, label), &table.export_table())
}

pub(crate) fn load_table(
    table: &mut ValueTable,
    board_size: usize,
    dir: &Path,
    label: &str,
) -> Result<(), CheckpointError> {
    let path = table_path(dir, label);
    let entries = read_table(&path)?;
    let count = table.import_table(entries, board_size)?;
    log::info!("Loaded {count} table entries from {}", path.display());
    Ok(())
}
