mod dqn;
mod q_learning;
mod sarsa;
mod tabular;

pub use dqn::{DqnAgent, DqnConfig, InferBackend, TrainBackend};
pub use q_learning::QLearningAgent;
pub use sarsa::SarsaAgent;
pub use tabular::TabularConfig;
