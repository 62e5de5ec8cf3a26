use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::Agent;
use crate::checkpoint::metadata::RunMetadata;
use crate::error::CheckpointError;
use crate::training::episode::EpisodeRecord;

const METADATA_FILE: &str = "metadata.json";

/// Write `contents` next to `path` and rename it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write a flat key -> value table as pretty JSON.
pub fn write_table(path: &Path, table: &BTreeMap<String, f32>) -> Result<(), CheckpointError> {
    let json = serde_json::to_string_pretty(table)?;
    write_atomic(path, json.as_bytes())
}

/// Read a table written by [`write_table`]. Keys are not validated here.
pub fn read_table(path: &Path) -> Result<BTreeMap<String, f32>, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write per-episode records keyed by episode number, counting from
/// `first_episode`, plus the run's wall clock time so far under key `"-1"`.
pub fn write_results(
    path: &Path,
    first_episode: usize,
    records: &[EpisodeRecord],
    clock_secs: f64,
) -> Result<(), CheckpointError> {
    let mut results = serde_json::Map::new();
    for (offset, record) in records.iter().enumerate() {
        results.insert(
            (first_episode + offset).to_string(),
            serde_json::to_value(record)?,
        );
    }
    results.insert(
        "-1".to_string(),
        serde_json::json!({ "clock-time": clock_secs }),
    );
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(results))?;
    write_atomic(path, json.as_bytes())
}

/// Saves and restores the learned state of both agents of a run under
/// `<checkpoint_dir>/<game>/`.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(checkpoint_dir: &Path, game: &str) -> Self {
        CheckpointManager {
            dir: checkpoint_dir.join(game),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save each `(label, agent)` pair and the run metadata.
    pub fn save_agents(
        &self,
        agents: &[(&str, &dyn Agent)],
        metadata: &RunMetadata,
    ) -> Result<PathBuf, CheckpointError> {
        fs::create_dir_all(&self.dir)?;
        for (label, agent) in agents {
            agent.save_to_dir(&self.dir, label)?;
            log::debug!("Saved {} agent '{}' to {}", agent.name(), label, self.dir.display());
        }
        let meta_json = serde_json::to_string_pretty(metadata)?;
        write_atomic(&self.dir.join(METADATA_FILE), meta_json.as_bytes())?;
        Ok(self.dir.clone())
    }

    pub fn load_metadata(&self) -> Result<RunMetadata, CheckpointError> {
        let path = self.dir.join(METADATA_FILE);
        let json = fs::read_to_string(&path).map_err(|e| CheckpointError::Read {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| CheckpointError::Parse { path, source: e })
    }

    /// Restore one agent's tables/weights saved under `label`.
    pub fn load_agent(&self, agent: &mut dyn Agent, label: &str) -> Result<(), CheckpointError> {
        agent.load_from_dir(&self.dir, label)
    }
}
