use std::fmt;

use super::algorithms::{DqnAgent, DqnConfig, QLearningAgent, SarsaAgent, TabularConfig};
use super::{Agent, RandomAgent};
use crate::game::{RuleEngine, Side};

/// The closed set of agent variants a side can be played by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    Random,
    QLearning,
    Sarsa,
    Dqn,
}

impl AgentKind {
    /// Whether the variant keeps learned state worth saving between runs.
    pub fn is_learner(self) -> bool {
        !matches!(self, AgentKind::Random)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentKind::Random => "random",
            AgentKind::QLearning => "q-learning",
            AgentKind::Sarsa => "sarsa",
            AgentKind::Dqn => "dqn",
        };
        f.write_str(name)
    }
}

/// Build a boxed agent of `kind` playing `side` under `engine`'s rules.
/// With a seed the agent's random choices are reproducible.
pub fn build_agent<R>(
    kind: AgentKind,
    engine: &R,
    side: Side,
    tabular: &TabularConfig,
    dqn: &DqnConfig,
    seed: Option<u64>,
) -> Box<dyn Agent>
where
    R: RuleEngine + Clone + 'static,
{
    let board_size = engine.new_board().size();
    match (kind, seed) {
        (AgentKind::Random, Some(seed)) => Box::new(RandomAgent::with_seed(side, seed)),
        (AgentKind::Random, None) => Box::new(RandomAgent::new(side)),
        (AgentKind::QLearning, Some(seed)) => Box::new(QLearningAgent::with_seed(
            engine.clone(),
            side,
            tabular.clone(),
            seed,
        )),
        (AgentKind::QLearning, None) => {
            Box::new(QLearningAgent::new(engine.clone(), side, tabular.clone()))
        }
        (AgentKind::Sarsa, Some(seed)) => Box::new(SarsaAgent::with_seed(
            engine.clone(),
            side,
            tabular.clone(),
            seed,
        )),
        (AgentKind::Sarsa, None) => Box::new(SarsaAgent::new(engine.clone(), side, tabular.clone())),
        (AgentKind::Dqn, Some(seed)) => {
            Box::new(DqnAgent::with_seed(board_size, side, dqn.clone(), seed))
        }
        (AgentKind::Dqn, None) => Box::new(DqnAgent::new(board_size, side, dqn.clone())),
    }
}
