use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ai::AgentKind;

/// Schedule endpoints recorded with a saved run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub epsilon_start: f32,
    pub epsilon_floor: f32,
    pub alpha_start: f32,
    pub alpha_floor: f32,
}

/// Describes the run that produced a set of saved tables/weights.
/// Written to `metadata.json` next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub game: String,
    pub board_size: usize,
    /// Agent variant per side label.
    pub agents: BTreeMap<String, AgentKind>,
    pub episodes: usize,
    pub timestamp: u64,
    pub schedule: ScheduleSnapshot,
}

impl RunMetadata {
    /// Whether saved state for `label` can be loaded into an agent of `kind`
    /// playing `game` on a board of `board_size`.
    pub fn is_compatible(&self, game: &str, board_size: usize, label: &str, kind: AgentKind) -> bool {
        self.game == game && self.board_size == board_size && self.agents.get(label) == Some(&kind)
    }
}
