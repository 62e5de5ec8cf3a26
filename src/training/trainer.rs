use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::ai::{Agent, AgentKind};
use crate::checkpoint::{write_results, CheckpointManager, RunMetadata, ScheduleSnapshot};
use crate::error::{CheckpointError, TrainingError};
use crate::game::{Outcome, RuleEngine, Side};
use crate::training::episode::{EpisodeDriver, EpisodeRecord};
use crate::training::metrics::{EpisodeResult, TrainingMetrics};
use crate::training::schedule::LinearDecay;

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    pub epsilon_start: f32,
    pub epsilon_floor: f32,
    pub alpha_start: f32,
    pub alpha_floor: f32,
    /// Episodes over which both rates decay; 0 means the whole run.
    pub decay_episodes: usize,
    pub log_interval: usize,
    pub seed: Option<u64>,
    /// Optional JSON file receiving every episode record.
    pub results_path: Option<PathBuf>,
    /// Episodes per results file; each chunk goes to `<stem>_<last episode>`
    /// next to `results_path`. 0 writes one file at `results_path` at the end.
    pub results_chunk: usize,
    pub checkpoint_dir: PathBuf,
    pub save_tables: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 10_000,
            epsilon_start: 0.8,
            epsilon_floor: 0.0,
            alpha_start: 0.5,
            alpha_floor: 0.0,
            decay_episodes: 0,
            log_interval: 100,
            seed: None,
            results_path: None,
            results_chunk: 5000,
            checkpoint_dir: PathBuf::from("training_results"),
            save_tables: true,
        }
    }
}

impl TrainerConfig {
    /// File receiving the results chunk that ends at `last_episode`.
    pub fn results_file(&self, last_episode: usize) -> Option<PathBuf> {
        let path = self.results_path.as_ref()?;
        if self.results_chunk == 0 {
            return Some(path.clone());
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results".to_string());
        let name = match path.extension() {
            Some(ext) => format!("{stem}_{last_episode}.{}", ext.to_string_lossy()),
            None => format!("{stem}_{last_episode}"),
        };
        Some(path.with_file_name(name))
    }

    fn decay_span(&self) -> usize {
        if self.decay_episodes == 0 {
            self.num_episodes
        } else {
            self.decay_episodes
        }
    }

    pub fn epsilon_schedule(&self) -> LinearDecay {
        LinearDecay::new(self.epsilon_start, self.epsilon_floor, self.decay_span())
    }

    pub fn alpha_schedule(&self) -> LinearDecay {
        LinearDecay::new(self.alpha_start, self.alpha_floor, self.decay_span())
    }
}

/// Totals over a whole training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub wins: [usize; 2],
    pub draws: usize,
    pub cheated: usize,
    pub elapsed_secs: f64,
}

impl TrainingSummary {
    pub fn wins_for(&self, side: Side) -> usize {
        self.wins[side.index()]
    }
}

/// Multi-episode training loop between two agents.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Trainer { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn checkpoint_manager<R: RuleEngine>(&self, driver: &EpisodeDriver<R>) -> CheckpointManager {
        CheckpointManager::new(&self.config.checkpoint_dir, driver.engine().name())
    }

    /// Run the full training loop.
    pub fn train<R: RuleEngine>(
        &self,
        driver: &mut EpisodeDriver<R>,
    ) -> Result<TrainingSummary, TrainingError> {
        let mut metrics = TrainingMetrics::with_capacity(self.config.log_interval);
        let epsilon = self.config.epsilon_schedule();
        let alpha = self.config.alpha_schedule();
        let keep_records = self.config.results_path.is_some();
        let mut records: Vec<EpisodeRecord> = Vec::new();
        let mut first_unwritten = 0;
        let mut summary = TrainingSummary {
            episodes: 0,
            wins: [0; 2],
            draws: 0,
            cheated: 0,
            elapsed_secs: 0.0,
        };

        let (label_a, label_b) = {
            let engine = driver.engine();
            (engine.side_label(Side::A), engine.side_label(Side::B))
        };
        log::info!(
            "Starting {} training for {} episodes: {} ({}) vs {} ({})",
            driver.engine().name(),
            self.config.num_episodes,
            label_a,
            driver.agent(Side::A).name(),
            label_b,
            driver.agent(Side::B).name(),
        );

        let start = Instant::now();
        for episode in 0..self.config.num_episodes {
            let eps = epsilon.value(episode);
            let lr = alpha.value(episode);
            let record = driver.play_episode(eps, lr);

            match record.outcome {
                Some(Outcome::Winner(side)) => summary.wins[side.index()] += 1,
                Some(Outcome::Draw) => summary.draws += 1,
                None => {}
            }
            if record.cheated {
                summary.cheated += 1;
            }
            summary.episodes += 1;
            metrics.record_episode(EpisodeResult::from(&record));
            log::debug!(
                "Episode {} | winner: {} | moves: {}",
                episode + 1,
                record.winner.as_deref().unwrap_or("none"),
                record.total_moves()
            );
            if keep_records {
                records.push(record);
                if records.len() == self.config.results_chunk {
                    self.flush_results(first_unwritten, &mut records, start)?;
                    first_unwritten = episode + 1;
                }
            }

            if (episode + 1) % self.config.log_interval == 0 {
                let window = self.config.log_interval;
                log::info!(
                    "Episode {}/{} | eps: {:.3} | alpha: {:.3} | {}: {:.1}% | {}: {:.1}% | draw: {:.1}% | avg_len: {:.1} | cheated: {}",
                    episode + 1,
                    self.config.num_episodes,
                    eps,
                    lr,
                    label_a,
                    metrics.win_rate(Side::A, window) * 100.0,
                    label_b,
                    metrics.win_rate(Side::B, window) * 100.0,
                    metrics.draw_rate(window) * 100.0,
                    metrics.average_game_length(window),
                    metrics.cheated_episodes(),
                );
            }
        }
        summary.elapsed_secs = start.elapsed().as_secs_f64();

        log::info!(
            "Training complete: {} episodes in {:.1}s | {} wins: {} | {} wins: {} | draws: {}",
            summary.episodes,
            summary.elapsed_secs,
            label_a,
            summary.wins_for(Side::A),
            label_b,
            summary.wins_for(Side::B),
            summary.draws,
        );

        if keep_records && !records.is_empty() {
            self.flush_results(first_unwritten, &mut records, start)?;
        }

        Ok(summary)
    }

    /// Write the buffered records, which start at `first_episode`, and clear
    /// the buffer.
    fn flush_results(
        &self,
        first_episode: usize,
        records: &mut Vec<EpisodeRecord>,
        start: Instant,
    ) -> Result<(), TrainingError> {
        let last_episode = first_episode + records.len().saturating_sub(1);
        let Some(path) = self.config.results_file(last_episode) else {
            return Ok(());
        };
        write_results(&path, first_episode, records, start.elapsed().as_secs_f64()).map_err(
            |e| TrainingError::Results {
                path: path.clone(),
                source: e,
            },
        )?;
        log::info!(
            "Results for episodes {}..={} written to {}",
            first_episode,
            last_episode,
            path.display()
        );
        records.clear();
        Ok(())
    }

    /// Save both agents' learned state with metadata describing this run.
    pub fn save_agents<R: RuleEngine>(
        &self,
        driver: &EpisodeDriver<R>,
        kinds: [AgentKind; 2],
    ) -> Result<PathBuf, TrainingError> {
        let engine = driver.engine();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = RunMetadata {
            game: engine.name().to_string(),
            board_size: driver.board().size(),
            agents: Side::BOTH
                .iter()
                .map(|&s| (engine.side_label(s).to_string(), kinds[s.index()]))
                .collect::<BTreeMap<_, _>>(),
            episodes: self.config.num_episodes,
            timestamp,
            schedule: ScheduleSnapshot {
                epsilon_start: self.config.epsilon_start,
                epsilon_floor: self.config.epsilon_floor,
                alpha_start: self.config.alpha_start,
                alpha_floor: self.config.alpha_floor,
            },
        };

        let agents: Vec<(&str, &dyn Agent)> = Side::BOTH
            .iter()
            .map(|&s| (engine.side_label(s), driver.agent(s)))
            .collect();
        let dir = self.checkpoint_manager(driver).save_agents(&agents, &metadata)?;
        log::info!("Saved agents to {}", dir.display());
        Ok(dir)
    }

    /// Restore learned state saved by [`Trainer::save_agents`] into every
    /// learning agent. Saved state from a different game, board size or agent
    /// variant is refused.
    pub fn load_agents<R: RuleEngine>(
        &self,
        driver: &mut EpisodeDriver<R>,
        kinds: [AgentKind; 2],
    ) -> Result<(), TrainingError> {
        let manager = self.checkpoint_manager(driver);
        let metadata = manager.load_metadata()?;
        let game = driver.engine().name();
        let board_size = driver.board().size();

        for side in Side::BOTH {
            let kind = kinds[side.index()];
            if !kind.is_learner() {
                continue;
            }
            let label = driver.engine().side_label(side);
            if !metadata.is_compatible(game, board_size, label, kind) {
                return Err(CheckpointError::Incompatible(format!(
                    "saved run in {} does not hold a {kind} agent for {label} on a {board_size}x{board_size} {game} board",
                    manager.dir().display()
                ))
                .into());
            }
            manager.load_agent(driver.agent_mut(side), label)?;
            log::info!("Loaded {kind} agent for {label} from {}", manager.dir().display());
        }
        Ok(())
    }
}
