mod agent;
pub mod algorithms;
mod kind;
pub mod networks;
mod random;
pub mod state_encoding;
mod value_table;

pub use agent::{Agent, AgentPhase, EpisodeMemory, Transition};
pub use algorithms::{DqnAgent, DqnConfig, QLearningAgent, SarsaAgent, TabularConfig};
pub use kind::{build_agent, AgentKind};
pub use networks::{DqnNetwork, DqnNetworkConfig};
pub use random::RandomAgent;
pub use value_table::{ValueTable, OPTIMISTIC_INITIAL_VALUE};
