//! Training infrastructure: the per-episode driver, the multi-episode
//! trainer, the DQN replay buffer, decay schedules and rolling metrics.

pub mod episode;
pub mod metrics;
pub mod replay_buffer;
pub mod schedule;
pub mod trainer;

pub use episode::{
    side_seed, EpisodeDriver, EpisodeRecord, IllegalMovePolicy, RewardConfig, SideSummary,
    StepOutcome,
};
pub use trainer::{Trainer, TrainerConfig, TrainingSummary};
