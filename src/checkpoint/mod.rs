mod manager;
mod metadata;

pub use manager::{read_table, write_results, write_table, CheckpointManager};
pub use metadata::{RunMetadata, ScheduleSnapshot};
